//! # Common API Types
//!
//! Helpers shared by the resource handlers: path/query id parsing, the serde
//! adapters for PUT bodies where "absent" and "null" differ, and lenient date
//! parsing.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, de};
use serde_json::Value;

use crate::error::ApiError;
use crate::ids::RecordId;

/// JSON body extractor whose rejections use the API problem format.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state).await?;
        Ok(Self(value))
    }
}

/// Parse a path or query identifier; non-numeric input is a 400 `INVALID_ID`.
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<RecordId>().map(RecordId::get).map_err(|_| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "INVALID_ID",
            format!("'{raw}' is not a valid identifier"),
        )
    })
}

/// Like [`parse_id`] for optional query parameters; blank counts as absent.
pub fn parse_optional_id(raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_id(raw).map(Some),
        None => Ok(None),
    }
}

/// Parse `true`/`false` (also `1`/`0`) from a query string.
pub fn parse_query_bool(field: &str, raw: Option<&str>) -> Result<Option<bool>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(crate::error::validation_error(
            &format!("'{field}' must be true or false"),
            serde_json::json!({ "field": field, "value": other }),
        )),
    }
}

/// Parse a date from a query string.
pub fn parse_query_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(text) => parse_date(text).map(Some).ok_or_else(|| {
            crate::error::validation_error(
                &format!("'{field}' must be a date (YYYY-MM-DD)"),
                serde_json::json!({ "field": field, "value": text }),
            )
        }),
    }
}

/// Overwrite `slot` when an update was supplied.
pub fn merge<T>(slot: &mut T, update: Option<T>) {
    if let Some(value) = update {
        *slot = value;
    }
}

/// Trim optional free text; blank becomes `None`.
pub fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Accepts `YYYY-MM-DD` or any RFC 3339 timestamp (its date part is kept).
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(text).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Accepts an RFC 3339 timestamp or a bare date (midnight UTC).
pub fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text).ok().or_else(|| {
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive).fixed_offset())
    })
}

/// Field that distinguishes absent (`None`) from explicit null (`Some(None)`).
/// Use with `#[serde(default, deserialize_with = "nullable")]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Optional date field; null or blank string → `None`.
pub fn de_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    de_nullable_date(deserializer).map(Option::flatten)
}

/// Date field for updates: absent → `None`, null or blank → `Some(None)`.
/// Use with `#[serde(default, deserialize_with = "de_nullable_date")]`.
pub fn de_nullable_date<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Some(None)),
        Value::String(text) if text.trim().is_empty() => Ok(Some(None)),
        Value::String(text) => parse_date(&text)
            .map(|date| Some(Some(date)))
            .ok_or_else(|| de::Error::custom(format!("'{text}' is not a valid date"))),
        other => Err(de::Error::custom(format!("expected a date string, found {other}"))),
    }
}

/// Optional timestamp field; null or blank string → `None`.
pub fn de_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => parse_timestamp(&text)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("'{text}' is not a valid timestamp"))),
        other => Err(de::Error::custom(format!("expected a timestamp string, found {other}"))),
    }
}

/// Numbers that clients sometimes send as strings (`"12"`, `"45.50"`).
/// Absent → `None`; null or blank → `Some(None)`.
pub fn de_nullable_number<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr + serde::de::DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Some(None)),
        Value::String(text) if text.trim().is_empty() => Ok(Some(None)),
        Value::String(text) => text
            .trim()
            .parse::<T>()
            .map(|n| Some(Some(n)))
            .map_err(|_| de::Error::custom(format!("'{text}' is not a valid number"))),
        number @ Value::Number(_) => serde_json::from_value::<T>(number)
            .map(|n| Some(Some(n)))
            .map_err(de::Error::custom),
        other => Err(de::Error::custom(format!("expected a number, found {other}"))),
    }
}

/// Booleans that clients sometimes send as strings or 0/1.
/// Absent → `None`; null → `Some(None)`.
pub fn de_nullable_bool<'de, D>(deserializer: D) -> Result<Option<Option<bool>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(Some(None)),
        Value::Bool(flag) => Ok(Some(Some(flag))),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(Some(Some(false))),
        Value::Number(n) if n.as_i64() == Some(1) => Ok(Some(Some(true))),
        Value::String(text) => match text.trim() {
            "true" | "1" => Ok(Some(Some(true))),
            "false" | "0" | "" => Ok(Some(Some(false))),
            _ => Err(de::Error::custom(format!("'{text}' is not a boolean"))),
        },
        other => Err(de::Error::custom(format!("expected a boolean, found {other}"))),
    }
}
