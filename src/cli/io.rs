//! JSON I/O handling for CLI
//!
//! - Input: one JSON object on stdin
//! - Output: one JSON object per invocation on stdout

use std::io::{Read, Write};

use serde_json::{json, Value};

use crate::document::Document;

use super::errors::{CliError, CliResult};

/// Read a document from `input`
pub fn read_document<R: Read>(mut input: R) -> CliResult<Document> {
    let mut content = String::new();
    input.read_to_string(&mut content)?;

    if content.trim().is_empty() {
        return Err(CliError::invalid_input("Empty input"));
    }
    parse_object(&content)
}

/// Parse a JSON object argument
pub fn parse_object(content: &str) -> CliResult<Document> {
    let value: Value = serde_json::from_str(content)?;
    Document::from_value(value).ok_or_else(|| CliError::invalid_input("expected a JSON object"))
}

/// Write a success response
pub fn write_response<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    let response = json!({
        "status": "ok",
        "data": data
    });
    write_line(out, &response)
}

/// Write an error response
pub fn write_error<W: Write>(out: &mut W, code: &str, message: &str) -> CliResult<()> {
    let response = json!({
        "status": "error",
        "code": code,
        "message": message
    });
    write_line(out, &response)
}

fn write_line<W: Write>(out: &mut W, response: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, response)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
