//! Document store for memodb
//!
//! A store persists one document type as one JSON file per document under
//! its storage directory and fronts the files with a shared
//! [`DocumentCache`](crate::cache::DocumentCache).
//!
//! # Guarantees
//!
//! - The file is canonical; the cache never holds a document without one
//! - Removal keeps exactly one backup generation (`<id>.<type>.old`)
//! - Writes replace files atomically (temp file then rename)
//! - Composite operations are not transactional; their failure windows end
//!   in a recoverable backup file

mod backend;
mod config;
mod document_store;
mod errors;
mod local;
mod paths;
mod query;

pub use backend::StorageBackend;
pub use config::{StoreConfig, StoreOptions, DEFAULT_DOC_TYPE, DEFAULT_STORAGE_PATH};
pub use document_store::DocumentStore;
pub use errors::{ErrorKind, StoreError, StoreResult};
pub use local::LocalBackend;
pub use paths::{StorePaths, BACKUP_SUFFIX};
pub use query::{Clause, Logic, PredicateFn, QueryEvaluator, Where};
