//! # Storage Backend Trait

use std::fmt;
use std::io;
use std::path::Path;

use async_trait::async_trait;

/// Filesystem capability consumed by the document store.
///
/// Paths are full paths; the store derives them from its storage root.
#[async_trait]
pub trait StorageBackend: Send + Sync + fmt::Debug {
    /// Check if a file exists at path
    async fn exists(&self, path: &Path) -> io::Result<bool>;

    /// Read the whole file at path
    async fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replace the file at path with data
    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Move a file, replacing any file already at the destination
    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Names of the regular files directly inside dir
    async fn list(&self, dir: &Path) -> io::Result<Vec<String>>;

    /// Create dir and any missing parents
    async fn create_dir_all(&self, dir: &Path) -> io::Result<()>;
}
