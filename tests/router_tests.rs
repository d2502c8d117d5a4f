//! Cross-cutting router behaviour: authentication, fallbacks, body
//! rejections, trace headers and the OpenAPI document.

mod test_utils;

use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::Value;
use test_utils::{TEST_TOKEN, TestApp};
use tower::ServiceExt;

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = TestApp::new().await.unwrap();

    let (status, body) = app.send(Method::GET, "/companies", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, body) = app
        .send(Method::GET, "/dashboard", None, Some("wrong-token"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = app.send(Method::GET, "/companies", None, Some(TEST_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn root_and_health_are_public() {
    let app = TestApp::new().await.unwrap();

    let (status, body) = app.send(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "outreach-crm");

    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn unknown_routes_are_not_found_even_without_a_token() {
    let app = TestApp::new().await.unwrap();

    let (status, body) = app.send(Method::GET, "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn unsupported_methods_are_rejected() {
    let app = TestApp::new().await.unwrap();

    let (status, _) = app
        .send(Method::PATCH, "/companies", None, Some(TEST_TOKEN))
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn malformed_json_is_a_validation_failure() {
    let app = TestApp::new().await.unwrap();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/companies")
        .header(header::AUTHORIZATION, format!("Bearer {TEST_TOKEN}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn invalid_ids_are_rejected_before_lookup() {
    let app = TestApp::new().await.unwrap();

    for uri in ["/engagements/12x", "/resources/abc", "/activities/1.5"] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["code"], "INVALID_ID", "{uri}");
    }
}

#[tokio::test]
async fn responses_carry_a_trace_id() {
    let app = TestApp::new().await.unwrap();

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-abc-123")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("x-trace-id").unwrap(),
        "req-abc-123"
    );

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    let generated = response.headers().get("x-trace-id").unwrap().to_str().unwrap();
    assert!(!generated.is_empty());
}

#[tokio::test]
async fn openapi_document_lists_the_api() {
    let app = TestApp::new().await.unwrap();

    let (status, doc) = app.send(Method::GET, "/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["info"]["title"], "Outreach CRM API");

    let paths = doc["paths"].as_object().unwrap();
    for path in [
        "/companies",
        "/companies/{id}",
        "/engagements",
        "/activities",
        "/files",
        "/tags",
        "/resources/distribute",
        "/distributions/{id}/click",
        "/dashboard",
    ] {
        assert!(paths.contains_key(path), "missing {path}");
    }
    assert!(doc["components"]["securitySchemes"]["bearer_auth"].is_object());

    let created_at = &doc["components"]["schemas"]["CompanyDto"]["properties"]["createdAt"];
    assert_eq!(created_at["type"], "string");
    assert_eq!(created_at["format"], "date-time");
}
