//! Schema type definitions
//!
//! Supported field types:
//! - string: UTF-8 string
//! - number: JSON number
//! - bool: Boolean
//! - date: RFC 3339 timestamp string
//! - array: JSON array

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{parse_timestamp, ID_FIELD};

/// Declared type of a document field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 string
    String,
    /// Integer or floating point number
    Number,
    /// Boolean
    Bool,
    /// RFC 3339 timestamp stored as a string
    Date,
    /// Array of arbitrary values
    Array,
}

impl FieldType {
    /// Returns the type name used in schema descriptions
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Bool => "bool",
            FieldType::Date => "date",
            FieldType::Array => "array",
        }
    }

    /// Checks whether a value has this type. No coercion.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (FieldType::String, Value::String(_)) => true,
            (FieldType::Number, Value::Number(_)) => true,
            (FieldType::Bool, Value::Bool(_)) => true,
            (FieldType::Date, Value::String(s)) => parse_timestamp(s).is_some(),
            (FieldType::Array, Value::Array(_)) => true,
            _ => false,
        }
    }
}

/// A single declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

/// Ordered mapping of field name to declared type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentSchema {
    fields: Vec<FieldDef>,
}

impl DocumentSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field. Redeclaring a name replaces its type.
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|def| def.name == name) {
            Some(def) => def.field_type = field_type,
            None => self.fields.push(FieldDef { name, field_type }),
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|def| def.name == name)
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|def| def.name == name)
            .map(|def| def.field_type)
    }

    /// Iterate over declared fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter()
    }

    /// Iterate over declared field names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|def| def.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Human readable description, e.g. `{id:string, since:date}`
    pub fn describe(&self) -> String {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|def| format!("{}:{}", def.name, def.field_type.type_name()))
            .collect();
        format!("{{{}}}", parts.join(", "))
    }

    /// Validates the schema structure itself (not a document)
    pub fn validate_structure(&self) -> Result<(), String> {
        match self.field_type(ID_FIELD) {
            None => Err(format!("Schema must define an '{}' field", ID_FIELD)),
            Some(FieldType::String) => Ok(()),
            Some(other) => Err(format!(
                "'{}' field must be a string, found {}",
                ID_FIELD,
                other.type_name()
            )),
        }
    }
}
