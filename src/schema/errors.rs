//! Schema error types
//!
//! Error codes:
//! - MEMO_SCHEMA_INVALID_TYPE_NAME
//! - MEMO_SCHEMA_ALREADY_REGISTERED
//! - MEMO_SCHEMA_UNKNOWN_TYPE
//! - MEMO_SCHEMA_MALFORMED
//!
//! Schema errors only happen while a registry is being assembled, before any
//! store is opened, so all of them are fatal for initialization.

use std::fmt;

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Type name is empty or cannot be used as a file extension
    InvalidTypeName,
    /// Type already present in the registry
    AlreadyRegistered,
    /// Type not present in the registry
    UnknownType,
    /// Schema definition does not hold together
    Malformed,
}

impl SchemaErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::InvalidTypeName => "MEMO_SCHEMA_INVALID_TYPE_NAME",
            SchemaErrorCode::AlreadyRegistered => "MEMO_SCHEMA_ALREADY_REGISTERED",
            SchemaErrorCode::UnknownType => "MEMO_SCHEMA_UNKNOWN_TYPE",
            SchemaErrorCode::Malformed => "MEMO_SCHEMA_MALFORMED",
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    /// Document type involved, when known
    doc_type: Option<String>,
}

impl SchemaError {
    pub fn invalid_type_name(doc_type: impl Into<String>) -> Self {
        let doc_type = doc_type.into();
        Self {
            code: SchemaErrorCode::InvalidTypeName,
            message: format!("Invalid document type name '{}'", doc_type),
            doc_type: Some(doc_type),
        }
    }

    pub fn already_registered(doc_type: impl Into<String>) -> Self {
        let doc_type = doc_type.into();
        Self {
            code: SchemaErrorCode::AlreadyRegistered,
            message: format!("Document type '{}' is already registered", doc_type),
            doc_type: Some(doc_type),
        }
    }

    pub fn unknown_type(doc_type: impl Into<String>) -> Self {
        let doc_type = doc_type.into();
        Self {
            code: SchemaErrorCode::UnknownType,
            message: format!("Document type '{}' is not registered", doc_type),
            doc_type: Some(doc_type),
        }
    }

    /// Malformed definition. `origin` is a file path or `<in-memory>`.
    pub fn malformed(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::Malformed,
            message: format!("Malformed schema in {}: {}", origin.into(), reason.into()),
            doc_type: None,
        }
    }

    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn doc_type(&self) -> Option<&str> {
        self.doc_type.as_deref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[FATAL] {}: {}", self.code, self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            SchemaError::unknown_type("note").code().code(),
            "MEMO_SCHEMA_UNKNOWN_TYPE"
        );
        assert_eq!(
            SchemaError::already_registered("memo").code(),
            SchemaErrorCode::AlreadyRegistered
        );
    }

    #[test]
    fn test_display_contains_type() {
        let err = SchemaError::invalid_type_name("a/b");
        let display = err.to_string();
        assert!(display.contains("MEMO_SCHEMA_INVALID_TYPE_NAME"));
        assert!(display.contains("a/b"));
        assert_eq!(err.doc_type(), Some("a/b"));
    }
}
