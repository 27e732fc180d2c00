//! Built-in document types

use serde_json::json;

use crate::document::{timestamp_now, Document};

use super::registry::TypeDefinition;
use super::types::{DocumentSchema, FieldType};

/// Every built-in type with its name
pub(crate) fn builtin_types() -> Vec<(&'static str, TypeDefinition)> {
    vec![
        ("memo", TypeDefinition::new(memo_schema(), memo_defaults)),
        ("quote", TypeDefinition::new(quote_schema(), quote_defaults)),
        ("wap", TypeDefinition::new(wap_schema(), wap_defaults)),
    ]
}

/// Short free-text note
pub fn memo_schema() -> DocumentSchema {
    DocumentSchema::new()
        .field("id", FieldType::String)
        .field("content", FieldType::String)
        .field("author", FieldType::String)
        .field("status", FieldType::String)
        .field("since", FieldType::Date)
        .field("lastupdate", FieldType::Date)
}

pub fn memo_defaults() -> Document {
    let now = timestamp_now();
    Document::new()
        .with("since", now.clone())
        .with("lastupdate", now)
        .with("status", "PUBLIC")
        .with("content", "")
        .with("author", "")
}

/// Attributed quotation
pub fn quote_schema() -> DocumentSchema {
    memo_schema().field("ref", FieldType::String)
}

pub fn quote_defaults() -> Document {
    memo_defaults().with("ref", "")
}

/// Web page with SEO metadata
pub fn wap_schema() -> DocumentSchema {
    DocumentSchema::new()
        .field("id", FieldType::String)
        .field("since", FieldType::Date)
        .field("lastupdate", FieldType::Date)
        .field("status", FieldType::String)
        .field("author", FieldType::String)
        .field("alias", FieldType::Array)
        .field("priority", FieldType::Number)
        .field("type", FieldType::String)
        .field("title", FieldType::String)
        .field("resume", FieldType::String)
        .field("content", FieldType::String)
        .field("contentlist", FieldType::Array)
        .field("category", FieldType::Array)
        .field("crosslink", FieldType::Array)
        .field("breadcrumb", FieldType::Array)
        .field("canonical", FieldType::String)
        .field("metatitle", FieldType::String)
        .field("metalocale", FieldType::String)
        .field("metadescription", FieldType::String)
        .field("metaentity", FieldType::String)
        .field("metaimage", FieldType::String)
        .field("metafollow", FieldType::Bool)
        .field("metaindex", FieldType::Bool)
}

pub fn wap_defaults() -> Document {
    let now = timestamp_now();
    Document::new()
        .with("since", now.clone())
        .with("lastupdate", now)
        .with("status", "PUBLIC")
        .with("author", "")
        .with("alias", json!([]))
        .with("priority", 1)
        .with("type", "wap")
        .with("title", "")
        .with("resume", "")
        .with("content", "")
        .with("contentlist", json!([]))
        .with("category", json!([]))
        .with("crosslink", json!([]))
        .with("canonical", "")
        .with("metatitle", "")
        .with("metadescription", "")
        .with("metaimage", "")
        .with("metafollow", true)
        .with("metaindex", true)
}
