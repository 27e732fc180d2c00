//! CLI module for memodb
//!
//! One subcommand per store operation: keys, count, schema, get, create,
//! update, stock, remove, remove-all, clone, rename, restore, random, find.

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{execute, open_store, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_object, read_document, write_error, write_response};
