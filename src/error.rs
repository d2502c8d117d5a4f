//! # Error Handling
//!
//! This module provides unified error handling for the Outreach CRM API,
//! implementing a consistent problem+json response format with trace ID propagation.
//! Unexpected failures are handed to [`crate::error_tracking`] and answered with a
//! generic message; their detail never reaches the client.

use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::{error_tracking, telemetry};

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing, skip_deserializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    #[schema(value_type = String, example = "COMPANY_NOT_FOUND")]
    pub code: Box<str>,
    /// Human-readable error message
    #[schema(value_type = String)]
    pub message: Box<str>,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Box<serde_json::Value>>,
    /// Correlation trace ID for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    /// Create a new API error with the given status code and message
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            trace_id: Self::current_trace_id(),
        }
    }

    /// Add details to the error
    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// Extract current trace ID from the active request (falls back to generated correlation ID)
    fn current_trace_id() -> Option<Box<str>> {
        telemetry::current_trace_id()
            .map(|trace_id| trace_id.into_boxed_str())
            .or_else(|| {
                Some(format!("corr-{}", &uuid::Uuid::new_v4().to_string()[..8]).into_boxed_str())
            })
    }

    /// Builds the generic 500 answer and ships `detail` to error tracking.
    pub fn internal(context: &str, detail: impl std::fmt::Debug) -> Self {
        let error = Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorType::InternalServerError.error_code(),
            "An internal error occurred",
        );
        error_tracking::capture(
            context,
            &format!("{detail:?}"),
            error.trace_id.as_deref(),
        );
        error
    }
}

/// Standard error types with predefined status codes
#[derive(Debug, Error)]
pub enum ErrorType {
    #[error("Bad Request")]
    BadRequest,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Not Found")]
    NotFound,
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error("Conflict")]
    Conflict,
    #[error("Internal Server Error")]
    InternalServerError,
    #[error("Service Unavailable")]
    ServiceUnavailable,
}

impl ErrorType {
    /// Get the appropriate HTTP status code for this error type
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorType::BadRequest => StatusCode::BAD_REQUEST,
            ErrorType::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorType::NotFound => StatusCode::NOT_FOUND,
            ErrorType::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorType::Conflict => StatusCode::CONFLICT,
            ErrorType::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorType::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get the error code string for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ErrorType::BadRequest => "VALIDATION_FAILED",
            ErrorType::Unauthorized => "UNAUTHORIZED",
            ErrorType::NotFound => "NOT_FOUND",
            ErrorType::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ErrorType::Conflict => "CONFLICT",
            ErrorType::InternalServerError => "INTERNAL_SERVER_ERROR",
            ErrorType::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

/// Errors returned by the repository layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A referenced row does not exist. `code` is the machine-readable API code.
    #[error("{message}")]
    NotFound { code: &'static str, message: String },
    /// Input rejected before reaching the database.
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl RepositoryError {
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        metrics::counter!("http_errors_total", "code" => self.code.to_string()).increment(1);

        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );

        if let Some(trace_id) = self.trace_id.as_deref()
            && let Ok(header_value) = HeaderValue::from_str(trace_id)
        {
            headers.insert("x-trace-id", header_value);
        }

        (self.status, headers, axum::Json(self)).into_response()
    }
}

// Error mappers for common sources

impl From<ErrorType> for ApiError {
    fn from(error_type: ErrorType) -> Self {
        Self::new(
            error_type.status_code(),
            error_type.error_code(),
            error_type.to_string(),
        )
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal("unhandled error", error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON: {}", err.body_text()),
            JsonRejection::JsonSyntaxError(err) => format!("JSON syntax error: {}", err.body_text()),
            JsonRejection::MissingJsonContentType(_) => {
                "Missing 'Content-Type: application/json' header".to_string()
            }
            _ => "Invalid request body".to_string(),
        };

        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { code, message } => {
                Self::new(StatusCode::NOT_FOUND, code, message)
            }
            RepositoryError::Validation { field, message } => validation_error(
                &message,
                serde_json::json!({ "field": field, "message": message }),
            ),
            RepositoryError::Database(db_err) => db_err.into(),
        }
    }
}

fn database_error_code(error: &sea_orm::DbErr) -> Option<String> {
    use sea_orm::RuntimeErr;

    let runtime_err = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return None,
    };

    runtime_err
        .as_database_error()
        .and_then(|db_error| db_error.code().map(|code| code.into_owned()))
}

fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    const PG_UNIQUE: &str = "23505";
    const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];

    if let Some(code) = database_error_code(error)
        && (code == PG_UNIQUE || SQLITE_DUPLICATE_CODES.contains(&code.as_str()))
    {
        return true;
    }

    let message = error.to_string().to_lowercase();
    message.contains("unique constraint") || message.contains("duplicate key")
}

/// Storage-level foreign-key failures, matched by SQLSTATE or by message text.
fn is_foreign_key_violation(error: &sea_orm::DbErr) -> bool {
    const PG_FOREIGN_KEY: &str = "23503";
    const SQLITE_FOREIGN_KEY: &str = "787";

    if let Some(code) = database_error_code(error)
        && (code == PG_FOREIGN_KEY || code == SQLITE_FOREIGN_KEY)
    {
        return true;
    }

    error.to_string().to_lowercase().contains("foreign key")
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(error: sea_orm::DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(?error, "Unique constraint violation detected");
            return Self::new(StatusCode::CONFLICT, "CONFLICT", "Resource already exists");
        }

        if is_foreign_key_violation(&error) {
            tracing::debug!(?error, "Foreign key violation detected");
            return Self::new(
                StatusCode::BAD_REQUEST,
                "FOREIGN_KEY_VIOLATION",
                "Referenced record does not exist",
            );
        }

        match error {
            sea_orm::DbErr::RecordNotFound(record) => Self::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Record not found: {}", record),
            ),
            sea_orm::DbErr::Conn(connection_err) => {
                tracing::error!("Database connection error: {:?}", connection_err);
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Database service unavailable",
                )
            }
            other => Self::internal("database error", other),
        }
    }
}

/// Create an unauthorized error (401)
pub fn unauthorized(message: Option<&str>) -> ApiError {
    let msg = message.unwrap_or("Authentication required");
    ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg)
}

/// Create a validation error with field details
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message).with_details(field_errors)
}

/// Create a 400 for a required field that is missing or blank
pub fn missing_field(field: &str) -> ApiError {
    validation_error(
        &format!("'{field}' is required"),
        serde_json::json!({ "field": field, "message": "Required field is missing or empty" }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_error_basic() {
        let error = ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "Test error message",
        );

        assert_eq!(error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(error.message, Box::from("Test error message"));
        assert_eq!(error.details, None);
    }

    #[test]
    fn test_error_type_mapping() {
        let not_found_error: ApiError = ErrorType::NotFound.into();
        assert_eq!(not_found_error.code, Box::from("NOT_FOUND"));
        assert_eq!(not_found_error.message, Box::from("Not Found"));

        let method: ApiError = ErrorType::MethodNotAllowed.into();
        assert_eq!(method.status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_from_anyhow_hides_detail() {
        let api_error: ApiError = anyhow::anyhow!("password=hunter2 leaked").into();

        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.code, Box::from("INTERNAL_SERVER_ERROR"));
        assert_eq!(api_error.message, Box::from("An internal error occurred"));
        assert!(api_error.details.is_none());
    }

    #[test]
    fn test_content_type_and_trace_headers() {
        let error = ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", "Test error");
        let trace_id = error.trace_id.clone().unwrap();

        let response = error.into_response();

        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/problem+json"
        );
        assert_eq!(
            response.headers().get("x-trace-id").unwrap(),
            trace_id.as_ref()
        );
    }

    #[test]
    fn test_trace_id_generation() {
        let error = ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "Test error",
        );

        let trace_id = error.trace_id.unwrap();
        assert!(trace_id.starts_with("corr-"));
        assert_eq!(trace_id.len(), 13);
    }

    #[test]
    fn test_database_error_mapping() {
        let api_error: ApiError = sea_orm::DbErr::RecordNotFound("test_record".to_string()).into();

        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.code, Box::from("NOT_FOUND"));
        assert!(api_error.message.contains("test_record"));
    }

    #[test]
    fn test_foreign_key_message_is_pattern_matched() {
        let db_error = sea_orm::DbErr::Custom(
            "insert or update on table \"engagements\" violates foreign key constraint".to_string(),
        );
        let api_error: ApiError = db_error.into();

        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_error.code, Box::from("FOREIGN_KEY_VIOLATION"));
    }

    #[test]
    fn test_unique_message_is_pattern_matched() {
        let db_error =
            sea_orm::DbErr::Custom("UNIQUE constraint failed: tags.name, tags.tag_type".to_string());
        let api_error: ApiError = db_error.into();

        assert_eq!(api_error.status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_unexpected_database_error_is_generic() {
        let api_error: ApiError = sea_orm::DbErr::Custom("syntax error near SELEKT".to_string()).into();

        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api_error.message.contains("SELEKT"));
    }

    #[test]
    fn test_repository_error_mapping() {
        let api_error: ApiError =
            RepositoryError::not_found("COMPANY_NOT_FOUND", "Company 9 not found").into();
        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.code, Box::from("COMPANY_NOT_FOUND"));

        let api_error: ApiError = RepositoryError::validation("name", "must not be empty").into();
        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(api_error.details.unwrap()["field"], json!("name"));
    }

    #[test]
    fn test_missing_field_helper() {
        let error = missing_field("companyId");
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert!(error.message.contains("companyId"));
    }
}
