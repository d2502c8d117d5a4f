//! # Tests for Handlers
//!
//! Handler-level tests that call the functions directly instead of going
//! through the router.

use std::sync::Arc;

use crate::auth::{SharedVerifier, StaticTokenVerifier};
use crate::config::AppConfig;
use crate::handlers::{health, root};
use crate::models::ServiceInfo;
use crate::server::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;

fn state_with(db: DatabaseConnection) -> AppState {
    let verifier: SharedVerifier = Arc::new(StaticTokenVerifier::new(vec!["test-token".to_string()]));
    AppState {
        db,
        config: Arc::new(AppConfig::default()),
        verifier,
    }
}

async fn memory_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.expect("sqlite memory database");
    crate::db::run_migrations(&db).await.expect("migrations");
    db
}

#[tokio::test]
async fn test_root_handler_returns_expected_service_info() {
    let Json(service_info) = root().await;

    assert_eq!(service_info.service, env!("CARGO_PKG_NAME"));
    assert_eq!(service_info.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_root_handler_returns_valid_json() {
    let Json(service_info) = root().await;
    let json_value: Value = serde_json::to_value(&service_info).expect("serialize ServiceInfo");

    assert_eq!(json_value["service"], "outreach-crm");
    assert!(json_value["version"].is_string());
}

#[test]
fn test_service_info_default() {
    let service_info = ServiceInfo::default();
    assert_eq!(service_info.service, "outreach-crm");
}

#[tokio::test]
async fn test_health_reports_ok_when_database_answers() {
    let state = state_with(memory_db().await);

    let Json(status) = health(State(state)).await.expect("healthy");
    assert_eq!(status.status, "ok");
}

#[tokio::test]
async fn test_health_is_unavailable_after_pool_closes() {
    let db = memory_db().await;
    db.clone().close().await.expect("close pool");
    let state = state_with(db);

    let error = health(State(state)).await.expect_err("closed pool");
    assert_eq!(error.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(&*error.code, "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_health_is_unavailable_without_database() {
    let state = state_with(DatabaseConnection::Disconnected);

    let error = health(State(state)).await.expect_err("disconnected database");
    assert_eq!(error.status, StatusCode::SERVICE_UNAVAILABLE);
}
