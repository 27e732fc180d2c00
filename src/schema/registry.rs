//! Per-type schema and default registry

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::document::Document;

use super::errors::{SchemaError, SchemaResult};
use super::models;
use super::types::DocumentSchema;

/// Factory producing the default field values of a new document
pub type DefaultsFn = Arc<dyn Fn() -> Document + Send + Sync>;

/// Schema plus default factory for one document type
#[derive(Clone)]
pub struct TypeDefinition {
    pub schema: DocumentSchema,
    pub defaults: DefaultsFn,
}

impl TypeDefinition {
    pub fn new<F>(schema: DocumentSchema, defaults: F) -> Self
    where
        F: Fn() -> Document + Send + Sync + 'static,
    {
        Self {
            schema,
            defaults: Arc::new(defaults),
        }
    }
}

impl fmt::Debug for TypeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDefinition")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// Registry of document types, keyed by type name.
///
/// Registered definitions are immutable.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: HashMap<String, TypeDefinition>,
}

impl SchemaRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in `memo`, `quote` and `wap` types
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for (doc_type, definition) in models::builtin_types() {
            registry.types.insert(doc_type.to_string(), definition);
        }
        registry
    }

    /// Register a new type.
    ///
    /// The type name becomes a file extension, so it must be non-empty and
    /// free of path separators and dots.
    pub fn register(
        &mut self,
        doc_type: impl Into<String>,
        definition: TypeDefinition,
    ) -> SchemaResult<()> {
        let doc_type = doc_type.into();
        validate_type_name(&doc_type)?;

        definition
            .schema
            .validate_structure()
            .map_err(|reason| SchemaError::malformed("<in-memory>", reason))?;

        if self.types.contains_key(&doc_type) {
            return Err(SchemaError::already_registered(doc_type));
        }

        self.types.insert(doc_type, definition);
        Ok(())
    }

    pub fn get(&self, doc_type: &str) -> Option<&TypeDefinition> {
        self.types.get(doc_type)
    }

    /// Like `get`, failing on unknown types
    pub fn require(&self, doc_type: &str) -> SchemaResult<&TypeDefinition> {
        self.get(doc_type)
            .ok_or_else(|| SchemaError::unknown_type(doc_type))
    }

    pub fn contains(&self, doc_type: &str) -> bool {
        self.types.contains_key(doc_type)
    }

    /// Registered type names, sorted
    pub fn types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Extensions of backup and temp files; as a type they would make those
/// files look like live documents
const RESERVED_TYPE_NAMES: [&str; 2] = ["old", "tmp"];

pub(crate) fn validate_type_name(doc_type: &str) -> SchemaResult<()> {
    let valid = !doc_type.trim().is_empty()
        && !RESERVED_TYPE_NAMES.contains(&doc_type)
        && !doc_type.contains(&['/', '\\', '.'][..])
        && !doc_type.chars().any(char::is_whitespace);

    if valid {
        Ok(())
    } else {
        Err(SchemaError::invalid_type_name(doc_type))
    }
}
