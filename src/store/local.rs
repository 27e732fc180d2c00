//! # Local Filesystem Backend

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::backend::StorageBackend;

/// Suffix of the scratch file a write goes through
pub const TEMP_SUFFIX: &str = ".tmp";

/// Local filesystem storage backend on `tokio::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalBackend;

impl LocalBackend {
    pub fn new() -> Self {
        Self
    }

    fn temp_path(path: &Path) -> PathBuf {
        let mut name = OsString::from(path.as_os_str());
        name.push(TEMP_SUFFIX);
        PathBuf::from(name)
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    async fn exists(&self, path: &Path) -> io::Result<bool> {
        fs::try_exists(path).await
    }

    async fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path).await
    }

    async fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        // Readers see either the old content or the new one, never a torn file.
        let temp_path = Self::temp_path(path);
        fs::write(&temp_path, data).await?;

        if let Err(e) = fs::rename(&temp_path, path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        if cfg!(windows) && fs::try_exists(to).await? {
            fs::remove_file(to).await?;
        }
        fs::rename(from, to).await
    }

    async fn list(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut entries = fs::read_dir(dir).await?;
        let mut names = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }

        Ok(names)
    }

    async fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir).await
    }
}
