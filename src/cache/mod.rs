//! Document cache for memodb
//!
//! The cache is never authoritative. A miss says nothing about whether the
//! document exists, and a hit never stands in for a successful write.
//!
//! Stores hold the cache as `Arc<dyn DocumentCache>`; several stores may
//! share one instance, in which case keys are namespaced by type
//! (`<id>.<type>`).

mod memo_cache;

pub use memo_cache::{AlertFn, CacheConfig, CacheStats, MemoCache};

use std::fmt;

use crate::document::Document;

/// Bounded key → document cache
pub trait DocumentCache: Send + Sync + fmt::Debug {
    /// Returns an independent copy of the cached document
    fn get(&self, key: &str) -> Option<Document>;

    /// Caches a copy of `document`. Returns false if it was not cached.
    fn set(&self, key: &str, document: &Document) -> bool;

    /// Drops the entry for `key`, if any
    fn delete(&self, key: &str);
}
