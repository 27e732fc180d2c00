//! memodb - a cached, file-backed document store
//!
//! Documents of one type live as one JSON file each under a storage
//! directory. A bounded in-memory cache fronts the files; the files are
//! always canonical.
//!
//! ```ignore
//! use std::sync::Arc;
//! use memodb::cache::{CacheConfig, MemoCache};
//! use memodb::document::{Document, Pick};
//! use memodb::store::{DocumentStore, StoreOptions};
//!
//! let cache = Arc::new(MemoCache::new(CacheConfig::default()));
//! let store = DocumentStore::open(StoreOptions::default(), cache).await?;
//! store.create(Document::new().with("id", "t1").with("content", "hello")).await?;
//! let memo = store.get("t1", &Pick::all()).await?;
//! ```

pub mod cache;
pub mod cli;
pub mod document;
pub mod observability;
pub mod schema;
pub mod store;
