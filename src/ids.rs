//! # Record Identifiers
//!
//! Primary keys are 64-bit integers that routinely exceed the range a binary
//! float represents exactly (values around 1.06e18 are normal). On the wire they
//! always travel as decimal strings, and anything arriving from a path segment,
//! query string or JSON body is converted without ever passing through `f64`.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Largest integer a binary64 float represents exactly (2^53 - 1).
pub const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Entity primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(pub i64);

/// A value that could not be read as a record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a valid record identifier")]
pub struct InvalidRecordId(pub String);

impl RecordId {
    pub fn get(self) -> i64 {
        self.0
    }

    /// Reads an identifier from an arbitrary JSON value.
    ///
    /// Goes through [`to_safe_id_string`] first so numbers are taken from their
    /// exact textual form.
    pub fn from_json(value: &Value) -> Result<Option<Self>, InvalidRecordId> {
        match to_safe_id_string(value) {
            Some(text) => text.parse().map(Some),
            None if value.is_null() => Ok(None),
            None => Err(InvalidRecordId(value.to_string())),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = InvalidRecordId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidRecordId(s.to_string()));
        }
        trimmed
            .parse::<i64>()
            .map(RecordId)
            .map_err(|_| InvalidRecordId(s.to_string()))
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<RecordId> for i64 {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordIdVisitor;

        impl Visitor<'_> for RecordIdVisitor {
            type Value = RecordId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or a decimal string identifier")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<RecordId, E> {
                Ok(RecordId(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<RecordId, E> {
                i64::try_from(v)
                    .map(RecordId)
                    .map_err(|_| E::custom(format!("identifier {v} is out of range")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RecordId, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(RecordIdVisitor)
    }
}

/// Returns the exact decimal form of an identifier-like JSON value.
///
/// Integers keep their exact digits, strings are passed through trimmed, and
/// `null` (or anything that cannot be an identifier) yields `None`.
pub fn to_safe_id_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                let f = n.as_f64()?;
                if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER as f64 {
                    Some((f as i64).to_string())
                } else {
                    // Already lossy by the time it reached us; report it as-is.
                    Some(f.to_string())
                }
            }
        }
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Maps [`to_safe_id_string`] over a JSON array; anything else yields an empty list.
pub fn to_safe_id_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(to_safe_id_string).collect(),
        _ => Vec::new(),
    }
}

/// Serde helper for optional id fields that may arrive as numbers, strings or null.
pub fn de_optional_record_id<'de, D>(deserializer: D) -> Result<Option<RecordId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    RecordId::from_json(&value).map_err(de::Error::custom)
}

/// Serde helper for id lists; null entries are skipped, non-lists become empty.
pub fn de_record_id_list<'de, D>(deserializer: D) -> Result<Vec<RecordId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    to_safe_id_string_list(&value)
        .iter()
        .map(|text| text.parse().map_err(de::Error::custom))
        .collect()
}

/// Like [`de_record_id_list`] but keeps "absent" distinct from "empty".
pub fn de_optional_record_id_list<'de, D>(
    deserializer: D,
) -> Result<Option<Vec<RecordId>>, D::Error>
where
    D: Deserializer<'de>,
{
    de_record_id_list(deserializer).map(Some)
}
