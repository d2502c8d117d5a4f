//! # Label List Codec
//!
//! Multi-valued attributes (tools delivered, sign-up categories, resources sent)
//! are stored in a single text column as a JSON array of strings. Rows written by
//! older clients may hold comma-separated text, a double-encoded JSON string, or
//! the literal `[object Object]`; decoding accepts all of them and never fails.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Marker left behind by a client that stringified an object instead of a list.
pub const OBJECT_MARKER: &str = "[object Object]";

/// Encodes labels as a JSON array string. An empty list encodes to `[]`.
pub fn encode(labels: &[String]) -> String {
    serde_json::to_string(labels).unwrap_or_else(|_| "[]".to_string())
}

/// Decodes a stored column value into labels.
pub fn decode(text: Option<&str>) -> Vec<String> {
    decode_text(text, true)
}

fn decode_text(text: Option<&str>, allow_nested: bool) -> Vec<String> {
    let Some(raw) = text else {
        return Vec::new();
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == OBJECT_MARKER {
        return Vec::new();
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Array(items)) => labels_from_array(&items),
        Ok(Value::String(inner)) if allow_nested => decode_text(Some(&inner), false),
        _ => split_commas(trimmed),
    }
}

/// Decodes a request-body value: arrays and strings are accepted, anything else is empty.
pub fn decode_value(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => labels_from_array(items),
        Value::String(text) => decode(Some(text)),
        _ => Vec::new(),
    }
}

fn labels_from_array(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
        .filter(|label| !label.is_empty() && label != OBJECT_MARKER)
        .collect()
}

fn split_commas(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty() && *segment != OBJECT_MARKER)
        .map(str::to_string)
        .collect()
}

/// A list of labels as it appears in request and response bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(transparent)]
pub struct LabelList(pub Vec<String>);

impl LabelList {
    /// Column representation of the list.
    pub fn encode(&self) -> String {
        encode(&self.0)
    }

    /// Reads a stored column value.
    pub fn from_column(text: &str) -> Self {
        Self(decode(Some(text)))
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl<'de> Deserialize<'de> for LabelList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self(decode_value(&value)))
    }
}
