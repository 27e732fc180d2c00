//! CLI-specific error types
//!
//! Store failures keep their store code (`NOTFOUND`, `DUPLICATE`, ...);
//! everything else is reported under a `MEMO_CLI_*` code.

use std::fmt;
use std::io;

use crate::schema::SchemaError;
use crate::store::{ErrorKind, StoreError};

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration or type definition error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Input is not what the command expects
    InvalidInput,
    /// Store operation failed
    Store(ErrorKind),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "MEMO_CLI_CONFIG_ERROR",
            Self::IoError => "MEMO_CLI_IO_ERROR",
            Self::InvalidInput => "MEMO_CLI_INVALID_INPUT",
            Self::Store(kind) => kind.code(),
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidInput, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::invalid_input(format!("JSON error: {}", e))
    }
}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        if e.is_fatal() {
            Self::config_error(e.to_string())
        } else {
            Self::new(CliErrorCode::Store(e.kind()), e.to_string())
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_keep_their_code() {
        let err = CliError::from(StoreError::NotFound { id: "t1".into() });
        assert_eq!(err.code_str(), "NOTFOUND");
        assert!(err.message().contains("t1"));
    }

    #[test]
    fn test_fatal_store_error_is_config() {
        let err = CliError::from(StoreError::config("missing schema"));
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }

    #[test]
    fn test_display() {
        let err = CliError::invalid_input("expected a JSON object");
        assert_eq!(
            err.to_string(),
            "MEMO_CLI_INVALID_INPUT: expected a JSON object"
        );
    }
}
