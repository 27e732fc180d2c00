//! Observability subsystem for memodb
//!
//! Logging goes through `tracing`. Each log line carries an `event` field
//! holding an [`Event`] name, so logs stay greppable by event.
//!
//! # Usage
//!
//! ```ignore
//! use memodb::observability::{init_logging, Event};
//!
//! init_logging("info");
//! tracing::info!(event = %Event::StoreOpened, doc_type = "memo", "store opened");
//! ```

mod events;

pub use events::Event;

use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter
pub const LOG_ENV: &str = "MEMODB_LOG";

/// Installs a JSON `tracing` subscriber writing to stderr.
///
/// The filter comes from `MEMODB_LOG` when set, else `default_filter`.
/// Returns false when a global subscriber was already installed.
pub fn init_logging(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
