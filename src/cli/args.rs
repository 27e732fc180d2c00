//! CLI argument definitions using clap
//!
//! Documents for `create`, `update` and `stock` are read as one JSON object
//! from stdin.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::store::Logic;

/// memodb - a cached, file-backed document store
#[derive(Parser, Debug)]
#[command(name = "memodb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Document type, overriding the configuration
    #[arg(long = "type", global = true)]
    pub doc_type: Option<String>,

    /// Storage directory, overriding the configuration
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List document ids
    Keys,

    /// Count documents
    Count,

    /// Describe the schema of the document type
    Schema,

    /// Read a document
    Get {
        id: String,
        /// Fields to return, separated by '|'
        #[arg(long)]
        pick: Option<String>,
    },

    /// Create a document read from stdin
    Create,

    /// Merge a document read from stdin into the stored one
    Update,

    /// Create or update a document read from stdin
    Stock {
        /// Update an existing document instead of leaving it unchanged
        #[arg(long)]
        merge: bool,
    },

    /// Remove a document, keeping a backup
    Remove { id: String },

    /// Remove every document
    RemoveAll,

    /// Copy a document to a new id
    Clone {
        from: String,
        to: String,
        /// JSON object of fields to overwrite in the copy
        #[arg(long = "with")]
        overrides: Option<String>,
    },

    /// Move a document to a new id
    Rename { from: String, to: String },

    /// Bring back the backup of a removed document
    Restore { id: String },

    /// Return random documents
    Random {
        #[arg(default_value_t = 1)]
        count: usize,
        #[arg(long)]
        pick: Option<String>,
    },

    /// Search documents by exact field values
    Find {
        /// JSON object of field values to match
        #[arg(long = "where")]
        query: Option<String>,
        /// AND or OR
        #[arg(long, default_value_t = Logic::And)]
        logic: Logic,
        #[arg(long)]
        pick: Option<String>,
    },
}

impl Command {
    /// Whether the command consumes a document from stdin
    pub fn reads_stdin(&self) -> bool {
        matches!(self, Command::Create | Command::Update | Command::Stock { .. })
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_find() {
        let cli = Cli::try_parse_from([
            "memodb", "find", "--where", r#"{"author":"ann"}"#, "--logic", "or",
        ])
        .unwrap();
        match cli.command {
            Command::Find { query, logic, pick } => {
                assert_eq!(query.as_deref(), Some(r#"{"author":"ann"}"#));
                assert_eq!(logic, Logic::Or);
                assert!(pick.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::try_parse_from(["memodb", "keys", "--type", "quote", "--storage", "/tmp/q"])
            .unwrap();
        assert_eq!(cli.command, Command::Keys);
        assert_eq!(cli.doc_type.as_deref(), Some("quote"));
        assert_eq!(cli.storage, Some(PathBuf::from("/tmp/q")));
    }

    #[test]
    fn test_random_default_count() {
        let cli = Cli::try_parse_from(["memodb", "random"]).unwrap();
        assert_eq!(cli.command, Command::Random { count: 1, pick: None });
        assert!(!cli.command.reads_stdin());
    }
}
