//! File naming for one store's type namespace
//!
//! - canonical: `<root>/<id>.<type>`
//! - backup:    `<root>/<id>.<type>.old`

use std::path::{Path, PathBuf};

/// Suffix of the single backup generation
pub const BACKUP_SUFFIX: &str = ".old";

#[derive(Debug, Clone)]
pub struct StorePaths {
    root: PathBuf,
    ext: String,
}

impl StorePaths {
    pub fn new(root: impl Into<PathBuf>, doc_type: &str) -> Self {
        Self {
            root: root.into(),
            ext: format!(".{}", doc_type),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extension including the leading dot
    pub fn ext(&self) -> &str {
        &self.ext
    }

    /// Cache key and file name: `<id>.<type>`
    pub fn key(&self, id: &str) -> String {
        format!("{}{}", id, self.ext)
    }

    pub fn filename(&self, id: &str) -> PathBuf {
        self.root.join(self.key(id))
    }

    pub fn backup_filename(&self, id: &str) -> PathBuf {
        self.root.join(format!("{}{}", self.key(id), BACKUP_SUFFIX))
    }

    /// An id must name a file directly inside the storage root
    pub fn is_valid_id(id: &str) -> bool {
        !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(&['/', '\\', '\0'][..])
    }

    /// Id of a directory entry, if it is a canonical file of this type
    pub fn id_from_file_name<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        file_name
            .strip_suffix(self.ext.as_str())
            .filter(|id| !id.is_empty())
    }
}
