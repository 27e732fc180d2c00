//! Schema registry for memodb
//!
//! Each document type declares its fields and a factory for default values.
//! Schemas are pure data: stores use them to filter fields on creation and
//! to strip unknown fields from search clauses.
//!
//! # Design Principles
//!
//! - Registered types are immutable
//! - Type names double as file extensions
//! - No coercion: `FieldType::accepts` is an exact match

mod errors;
mod loader;
pub mod models;
mod registry;
mod types;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult};
pub use loader::SchemaLoader;
pub use registry::{DefaultsFn, SchemaRegistry, TypeDefinition};
pub use types::{DocumentSchema, FieldDef, FieldType};

pub(crate) use registry::validate_type_name;
