//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the Outreach CRM API.
//! Everything except [`root`] and [`health`] sits behind the bearer-token
//! middleware in [`crate::auth`].

use crate::db;
use crate::error::ApiError;
use crate::models::{HealthStatus, ServiceInfo};
use crate::server::AppState;
use axum::{extract::State, http::StatusCode, response::Json};

pub mod activities;
pub mod companies;
pub mod dashboard;
pub mod engagements;
pub mod files;
pub mod follow_ups;
pub mod resources;
pub mod tags;
pub mod types;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Liveness and database reachability
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and database are up", body = HealthStatus),
        (status = 503, description = "Database unreachable", body = ApiError)
    ),
    tag = "root"
)]
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthStatus>, ApiError> {
    db::health_check(&state.db).await.map_err(|error| {
        tracing::warn!(error = %error, "Health check failed");
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database is unavailable",
        )
    })?;

    Ok(Json(HealthStatus {
        status: "ok".to_string(),
    }))
}

#[cfg(test)]
mod tests;
