//! Test utilities for router-level testing.
//!
//! This module sets up an in-memory SQLite database with all migrations applied
//! and wraps the application router so tests can issue authenticated requests
//! with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use migration::{Migrator, MigratorTrait};
use outreach_crm::auth::{SharedVerifier, StaticTokenVerifier};
use outreach_crm::config::AppConfig;
use outreach_crm::server::{AppState, create_app};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_TOKEN: &str = "test-token-123";

/// Sets up an in-memory SQLite database with all migrations applied.
///
/// The pool holds a single connection: every connection to `sqlite::memory:`
/// opens its own empty database.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await?;

    Migrator::up(&db, None).await?;

    Ok(db)
}

/// Router plus the database behind it
pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let db = setup_test_db().await?;

        let config = AppConfig {
            profile: "test".to_string(),
            api_tokens: vec![TEST_TOKEN.to_string()],
            ..AppConfig::default()
        };
        let verifier: SharedVerifier =
            Arc::new(StaticTokenVerifier::new(config.api_tokens.clone()));

        let router = create_app(AppState {
            db: db.clone(),
            config: Arc::new(config),
            verifier,
        });

        Ok(Self { router, db })
    }

    /// Authenticated request; returns the status and the parsed JSON body
    /// (`Value::Null` for an empty body).
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send(method, uri, body, Some(TEST_TOKEN)).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Creates a company and returns its id as sent on the wire
    pub async fn create_company(&self, name: &str) -> String {
        let (status, body) = self
            .post("/companies", serde_json::json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create company: {body}");
        body["id"].as_str().unwrap().to_string()
    }

    /// Creates a tag and returns its id as sent on the wire
    pub async fn create_tag(&self, name: &str, tag_type: &str) -> String {
        let (status, body) = self
            .post("/tags", serde_json::json!({ "name": name, "type": tag_type }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create tag: {body}");
        body["id"].as_str().unwrap().to_string()
    }

    /// Creates a resource and returns its id as sent on the wire
    pub async fn create_resource(&self, title: &str) -> String {
        let (status, body) = self
            .post("/resources", serde_json::json!({ "title": title }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create resource: {body}");
        body["id"].as_str().unwrap().to_string()
    }
}
