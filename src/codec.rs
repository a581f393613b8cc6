//! Structured-value codec for JSON-encoded cells.
//!
//! Object and list columns are stored as JSON text inside a single CSV cell.
//! A blank cell, JSON `null`, or an explicit null token decodes to `None`
//! ("no structure"), never to an empty container. Encoding an empty
//! container produces an empty cell so that a merge of two blank cells stays
//! blank.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::cell;

pub type JsonObject = Map<String, Value>;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("expected a JSON {expected}, found a JSON {found}")]
    Shape {
        expected: &'static str,
        found: &'static str,
    },
}

fn decode(text: &str) -> Result<Option<Value>, CodecError> {
    if cell::is_missing(text) {
        return Ok(None);
    }
    match serde_json::from_str::<Value>(text.trim())? {
        Value::Null => Ok(None),
        other => Ok(Some(other)),
    }
}

pub fn decode_object(text: &str) -> Result<Option<JsonObject>, CodecError> {
    match decode(text)? {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(CodecError::Shape {
            expected: "object",
            found: kind_name(&other),
        }),
    }
}

pub fn decode_list(text: &str) -> Result<Option<Vec<Value>>, CodecError> {
    match decode(text)? {
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(other) => Err(CodecError::Shape {
            expected: "list",
            found: kind_name(&other),
        }),
    }
}

pub fn encode_object(object: &JsonObject) -> String {
    if object.is_empty() {
        return String::new();
    }
    Value::Object(object.clone()).to_string()
}

pub fn encode_list(items: &[Value]) -> String {
    if items.is_empty() {
        return String::new();
    }
    Value::Array(items.to_vec()).to_string()
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
