//! Document store errors
//!
//! Error codes:
//! - MISSING_PARAMS: required argument absent
//! - INVALID_ID: id is not a single file name component
//! - NOTFOUND: no such document
//! - DUPLICATE: id collision on create
//! - LOADINGFILE: file present but unreadable or malformed
//! - CLONE: origin vanished during a rename
//! - REMOVE: rename could not retire the origin
//! - IO: filesystem failure on write, rename or listing
//! - CONFIG: store misconfigured (FATAL, construction only)

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::schema::SchemaError;

/// Error kind, independent of the identifiers involved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MissingParams,
    InvalidId,
    NotFound,
    Duplicate,
    LoadingFile,
    Clone,
    Remove,
    Io,
    Config,
}

impl ErrorKind {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::MissingParams => "MISSING_PARAMS",
            ErrorKind::InvalidId => "INVALID_ID",
            ErrorKind::NotFound => "NOTFOUND",
            ErrorKind::Duplicate => "DUPLICATE",
            ErrorKind::LoadingFile => "LOADINGFILE",
            ErrorKind::Clone => "CLONE",
            ErrorKind::Remove => "REMOVE",
            ErrorKind::Io => "IO",
            ErrorKind::Config => "CONFIG",
        }
    }

    /// Configuration errors abort initialization; everything else fails
    /// only the operation that raised it
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::Config)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Structured store failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing required params: {param}")]
    MissingParams { param: &'static str },

    #[error("Invalid document id '{id}'")]
    InvalidId { id: String },

    #[error("Can not find the document '{id}'")]
    NotFound { id: String },

    #[error("Duplicate entry '{id}'")]
    Duplicate { id: String },

    #[error("Can not load the document '{id}' from {}: {reason}", .path.display())]
    LoadingFile {
        id: String,
        path: PathBuf,
        reason: String,
    },

    #[error("Bad clone response: '{origin}' vanished while renaming to '{destination}'")]
    Clone { origin: String, destination: String },

    #[error("Renamed '{origin}' to '{destination}' but could not remove the origin: {source}")]
    Remove {
        origin: String,
        destination: String,
        #[source]
        source: Box<StoreError>,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid store configuration: {0}")]
    Config(String),
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        StoreError::Config(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::MissingParams { .. } => ErrorKind::MissingParams,
            StoreError::InvalidId { .. } => ErrorKind::InvalidId,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Duplicate { .. } => ErrorKind::Duplicate,
            StoreError::LoadingFile { .. } => ErrorKind::LoadingFile,
            StoreError::Clone { .. } => ErrorKind::Clone,
            StoreError::Remove { .. } => ErrorKind::Remove,
            StoreError::Io { .. } => ErrorKind::Io,
            StoreError::Config(_) => ErrorKind::Config,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }

    /// Document id the error is about, when there is one
    pub fn id(&self) -> Option<&str> {
        match self {
            StoreError::InvalidId { id }
            | StoreError::NotFound { id }
            | StoreError::Duplicate { id }
            | StoreError::LoadingFile { id, .. } => Some(id),
            StoreError::Clone { origin, .. } | StoreError::Remove { origin, .. } => Some(origin),
            _ => None,
        }
    }
}

impl From<SchemaError> for StoreError {
    fn from(err: SchemaError) -> Self {
        StoreError::Config(err.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(StoreError::MissingParams { param: "id" }.code(), "MISSING_PARAMS");
        assert_eq!(StoreError::InvalidId { id: "../a".into() }.code(), "INVALID_ID");
        assert_eq!(StoreError::NotFound { id: "a".into() }.code(), "NOTFOUND");
        assert_eq!(StoreError::Duplicate { id: "a".into() }.code(), "DUPLICATE");
        assert_eq!(
            StoreError::Clone {
                origin: "a".into(),
                destination: "b".into()
            }
            .code(),
            "CLONE"
        );
    }

    #[test]
    fn test_only_config_is_fatal() {
        assert!(StoreError::config("missing type").is_fatal());
        assert!(!StoreError::NotFound { id: "a".into() }.is_fatal());
        assert!(!StoreError::io("/tmp/x", io::Error::new(io::ErrorKind::Other, "disk")).is_fatal());
    }

    #[test]
    fn test_display_carries_identifiers() {
        let err = StoreError::LoadingFile {
            id: "t1".into(),
            path: PathBuf::from("memo/t1.memo"),
            reason: "expected value".into(),
        };
        let display = err.to_string();
        assert!(display.contains("t1"));
        assert!(display.contains("memo/t1.memo"));
        assert_eq!(err.id(), Some("t1"));
    }

    #[test]
    fn test_remove_keeps_source() {
        let err = StoreError::Remove {
            origin: "a".into(),
            destination: "b".into(),
            source: Box::new(StoreError::io("memo/a.memo", io::Error::new(io::ErrorKind::Other, "busy"))),
        };
        assert_eq!(err.kind(), ErrorKind::Remove);
        assert!(std::error::Error::source(&err).is_some());
    }
}
