//! Failure Window Tests
//!
//! Composite operations are sequences of file steps. These tests inject
//! filesystem faults between steps and check the documented outcomes:
//! - update interrupted after remove: record survives as backup, restorable
//! - rename whose remove step fails: REMOVE, document under both ids
//! - rename whose origin vanishes: CLONE, document under the new id only

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use memodb::cache::{CacheConfig, MemoCache};
use memodb::document::{Document, Pick};
use memodb::store::{
    DocumentStore, ErrorKind, LocalBackend, StorageBackend, StoreError, StoreOptions,
};
use tempfile::TempDir;

// =============================================================================
// Fault Injection
// =============================================================================

/// Local backend with switchable faults
#[derive(Debug, Default)]
struct FaultyBackend {
    inner: LocalBackend,
    fail_writes: AtomicBool,
    backup_fault: Mutex<Option<io::ErrorKind>>,
}

impl FaultyBackend {
    fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn fail_backups(&self, kind: Option<io::ErrorKind>) {
        *self.backup_fault.lock().unwrap() = kind;
    }
}

#[async_trait]
impl StorageBackend for FaultyBackend {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        self.inner.exists(path).await
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.inner.write(path, data).await
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let is_backup = to.to_string_lossy().ends_with(".old");
        let fault = *self.backup_fault.lock().unwrap();
        if let (true, Some(kind)) = (is_backup, fault) {
            return Err(io::Error::from(kind));
        }
        self.inner.rename(from, to).await
    }

    async fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
        self.inner.list(dir).await
    }

    async fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        self.inner.create_dir_all(dir).await
    }
}

async fn open(temp: &TempDir) -> (DocumentStore, Arc<FaultyBackend>) {
    let backend = Arc::new(FaultyBackend::default());
    let cache = Arc::new(MemoCache::new(CacheConfig::default()));
    let options = StoreOptions::default().with_storage_path(temp.path().join("memo"));
    let store = DocumentStore::open_with_backend(options, cache, backend.clone())
        .await
        .unwrap();
    (store, backend)
}

fn memo(id: &str, content: &str) -> Document {
    Document::new().with("id", id).with("content", content)
}

// =============================================================================
// Update Window
// =============================================================================

/// A crash between the remove and create steps of update leaves the record
/// only in its backup; restore brings back the pre-update version.
#[tokio::test]
async fn test_interrupted_update_is_restorable() {
    let temp = TempDir::new().unwrap();
    let (store, backend) = open(&temp).await;

    store.create(memo("t1", "before")).await.unwrap();

    backend.fail_writes(true);
    let err = store.update(memo("t1", "after")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    backend.fail_writes(false);

    assert!(!store.exists("t1").await.unwrap());
    assert!(store.has_backup("t1").await.unwrap());
    assert_eq!(store.count().await.unwrap(), 0);

    let restored = store.restore("t1").await.unwrap();
    assert_eq!(restored.get_str("content"), Some("before"));
    assert_eq!(store.keys().await.unwrap(), vec!["t1"]);
    assert_eq!(
        store.get("t1", &Pick::all()).await.unwrap().get_str("content"),
        Some("before")
    );
}

/// A failed create writes nothing and caches nothing.
#[tokio::test]
async fn test_failed_create_leaves_no_trace() {
    let temp = TempDir::new().unwrap();
    let (store, backend) = open(&temp).await;

    backend.fail_writes(true);
    assert_eq!(store.create(memo("t1", "x")).await.unwrap_err().code(), "IO");
    backend.fail_writes(false);

    assert!(!store.exists("t1").await.unwrap());
    assert!(store.keys().await.unwrap().is_empty());
}

// =============================================================================
// Rename Window
// =============================================================================

/// If the clone fails, the origin is untouched.
#[tokio::test]
async fn test_rename_clone_failure_leaves_origin() {
    let temp = TempDir::new().unwrap();
    let (store, backend) = open(&temp).await;

    store.create(memo("a", "x")).await.unwrap();

    backend.fail_writes(true);
    assert!(store.rename("a", "b").await.is_err());
    backend.fail_writes(false);

    assert!(store.exists("a").await.unwrap());
    assert!(!store.exists("b").await.unwrap());
    assert!(!store.has_backup("a").await.unwrap());
}

/// If the remove step fails, the document exists under both ids.
#[tokio::test]
async fn test_rename_remove_failure() {
    let temp = TempDir::new().unwrap();
    let (store, backend) = open(&temp).await;

    store.create(memo("a", "x")).await.unwrap();

    backend.fail_backups(Some(io::ErrorKind::PermissionDenied));
    let err = store.rename("a", "b").await.unwrap_err();
    backend.fail_backups(None);

    assert_eq!(err.code(), "REMOVE");
    match &err {
        StoreError::Remove {
            origin,
            destination,
            source,
        } => {
            assert_eq!(origin, "a");
            assert_eq!(destination, "b");
            assert_eq!(source.kind(), ErrorKind::Io);
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(store.keys().await.unwrap(), vec!["a", "b"]);
}

/// If the origin vanished before the remove step, the rename reports CLONE
/// and the document lives under the new id.
#[tokio::test]
async fn test_rename_origin_vanished() {
    let temp = TempDir::new().unwrap();
    let (store, backend) = open(&temp).await;

    store.create(memo("a", "x")).await.unwrap();

    backend.fail_backups(Some(io::ErrorKind::NotFound));
    let err = store.rename("a", "b").await.unwrap_err();
    backend.fail_backups(None);

    assert_eq!(err.code(), "CLONE");
    assert_eq!(err.id(), Some("a"));
    assert_eq!(
        store.get("b", &Pick::all()).await.unwrap().get_str("content"),
        Some("x")
    );
}
