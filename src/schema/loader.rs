//! Schema loader for type definitions stored on disk
//!
//! A type definition file is a JSON object:
//!
//! ```json
//! {
//!   "type": "note",
//!   "fields": [{"name": "id", "type": "string"}, {"name": "text", "type": "string"}],
//!   "defaults": {"text": ""}
//! }
//! ```
//!
//! Every `*.json` file in the schema directory is one type. Malformed files
//! abort loading.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::document::Document;

use super::errors::{SchemaError, SchemaResult};
use super::registry::{SchemaRegistry, TypeDefinition};
use super::types::DocumentSchema;

#[derive(Debug, Deserialize)]
struct TypeFile {
    #[serde(rename = "type")]
    doc_type: String,
    fields: DocumentSchema,
    #[serde(default)]
    defaults: Map<String, Value>,
}

/// Reads type definition files into a registry.
pub struct SchemaLoader {
    schema_dir: PathBuf,
}

impl SchemaLoader {
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: schema_dir.into(),
        }
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Loads every definition file into `registry`.
    ///
    /// A missing directory loads nothing. Returns the number of types added.
    pub fn load_into(&self, registry: &mut SchemaRegistry) -> SchemaResult<usize> {
        if !self.schema_dir.exists() {
            return Ok(0);
        }

        let entries = fs::read_dir(&self.schema_dir).map_err(|e| {
            SchemaError::malformed(
                self.schema_dir.display().to_string(),
                format!("Failed to read schema directory: {}", e),
            )
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SchemaError::malformed(
                    self.schema_dir.display().to_string(),
                    format!("Failed to read directory entry: {}", e),
                )
            })?;

            let path = entry.path();
            if path.extension().map_or(false, |ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        for path in &paths {
            let (doc_type, definition) = Self::load_file(path)?;
            registry.register(doc_type, definition)?;
        }

        Ok(paths.len())
    }

    /// Loads a single definition file.
    pub fn load_file(path: &Path) -> SchemaResult<(String, TypeDefinition)> {
        let origin = path.display().to_string();

        let content = fs::read_to_string(path)
            .map_err(|e| SchemaError::malformed(&origin, format!("Failed to read file: {}", e)))?;

        let file: TypeFile = serde_json::from_str(&content)
            .map_err(|e| SchemaError::malformed(&origin, format!("Invalid JSON: {}", e)))?;

        file.fields
            .validate_structure()
            .map_err(|reason| SchemaError::malformed(&origin, reason))?;

        for (field, value) in &file.defaults {
            let declared = file.fields.field_type(field).ok_or_else(|| {
                SchemaError::malformed(&origin, format!("default for undeclared field '{}'", field))
            })?;
            if !declared.accepts(value) {
                return Err(SchemaError::malformed(
                    &origin,
                    format!("default for '{}' is not a {}", field, declared.type_name()),
                ));
            }
        }

        let defaults = Document::from(file.defaults);
        let definition = TypeDefinition::new(file.fields, move || defaults.clone());
        Ok((file.doc_type, definition))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaErrorCode;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_type(dir: &Path, name: &str, body: Value) {
        fs::write(dir.join(name), serde_json::to_string_pretty(&body).unwrap()).unwrap();
    }

    fn note_file() -> Value {
        json!({
            "type": "note",
            "fields": [
                {"name": "id", "type": "string"},
                {"name": "text", "type": "string"},
                {"name": "tags", "type": "array"}
            ],
            "defaults": {"text": "", "tags": []}
        })
    }

    #[test]
    fn test_load_definitions() {
        let temp_dir = TempDir::new().unwrap();
        write_type(temp_dir.path(), "note.json", note_file());
        fs::write(temp_dir.path().join("README.txt"), "ignored").unwrap();

        let mut registry = SchemaRegistry::builtin();
        let loaded = SchemaLoader::new(temp_dir.path())
            .load_into(&mut registry)
            .unwrap();

        assert_eq!(loaded, 1);
        let note = registry.require("note").unwrap();
        assert!(note.schema.contains("tags"));
        assert_eq!((note.defaults)().get("tags"), Some(&json!([])));
    }

    #[test]
    fn test_missing_directory_loads_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = SchemaRegistry::new();
        let loaded = SchemaLoader::new(temp_dir.path().join("absent"))
            .load_into(&mut registry)
            .unwrap();
        assert_eq!(loaded, 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_default_type_mismatch_is_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let mut body = note_file();
        body["defaults"]["text"] = json!(3);
        write_type(temp_dir.path(), "note.json", body);

        let mut registry = SchemaRegistry::new();
        let err = SchemaLoader::new(temp_dir.path())
            .load_into(&mut registry)
            .unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::Malformed);
        assert!(err.message().contains("text"));
    }

    #[test]
    fn test_undeclared_default_is_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let mut body = note_file();
        body["defaults"]["color"] = json!("red");
        write_type(temp_dir.path(), "note.json", body);

        let result = SchemaLoader::load_file(&temp_dir.path().join("note.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("broken.json"), "{not json").unwrap();

        let mut registry = SchemaRegistry::new();
        let err = SchemaLoader::new(temp_dir.path())
            .load_into(&mut registry)
            .unwrap_err();
        assert!(err.message().contains("Invalid JSON"));
    }
}
