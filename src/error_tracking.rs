//! # Error Tracking
//!
//! Forwards unexpected failures to an external collector. Every captured error is
//! logged locally; when `OUTREACH_ERROR_TRACKING_URL` is configured the event is
//! also POSTed as JSON from a detached task so the request path never waits on it.

use std::sync::OnceLock;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, warn};
use url::Url;

use crate::config::AppConfig;

static REPORTER: OnceLock<ErrorReporter> = OnceLock::new();

/// Event body sent to the collector
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEvent {
    pub trace_id: Option<String>,
    pub message: String,
    pub detail: String,
    pub timestamp: String,
    pub service: &'static str,
    pub version: &'static str,
}

/// Delivers error events to the configured collector endpoint
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    client: Client,
    endpoint: Option<Url>,
}

impl ErrorReporter {
    /// Create a reporter; `endpoint` of `None` keeps events local.
    pub fn new(endpoint: Option<Url>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let endpoint = config
            .error_tracking_url
            .as_deref()
            .and_then(|raw| Url::parse(raw).ok());
        Self::new(endpoint)
    }

    pub fn endpoint(&self) -> Option<&Url> {
        self.endpoint.as_ref()
    }

    /// Send one event to the collector. Returns an error if delivery fails.
    pub async fn send(&self, event: &ErrorEvent) -> Result<(), reqwest::Error> {
        let Some(endpoint) = self.endpoint.clone() else {
            return Ok(());
        };

        self.client
            .post(endpoint)
            .json(event)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Install the process-wide reporter. Later calls are ignored.
pub fn install(reporter: ErrorReporter) {
    if REPORTER.set(reporter).is_err() {
        warn!("Error reporter already installed; keeping the first one");
    }
}

/// Record an unexpected failure. The detail is logged and forwarded, never returned.
pub fn capture(message: &str, detail: &str, trace_id: Option<&str>) {
    error!(trace_id = trace_id.unwrap_or("-"), detail, "{}", message);

    let Some(reporter) = REPORTER.get() else {
        return;
    };
    if reporter.endpoint.is_none() {
        return;
    }
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        return;
    };

    let event = ErrorEvent {
        trace_id: trace_id.map(str::to_string),
        message: message.to_string(),
        detail: detail.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    };
    let reporter = reporter.clone();

    runtime.spawn(async move {
        if let Err(err) = reporter.send(&event).await {
            warn!(error = %err, "Failed to deliver error event to collector");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_event() -> ErrorEvent {
        ErrorEvent {
            trace_id: Some("corr-1234abcd".to_string()),
            message: "database error".to_string(),
            detail: "connection reset".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            service: "outreach-crm",
            version: "0.1.0",
        }
    }

    #[tokio::test]
    async fn send_posts_event_to_collector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/events"))
            .and(body_partial_json(serde_json::json!({
                "trace_id": "corr-1234abcd",
                "detail": "connection reset"
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = Url::parse(&format!("{}/events", server.uri())).unwrap();
        let reporter = ErrorReporter::new(Some(endpoint)).unwrap();

        reporter.send(&sample_event()).await.unwrap();
    }

    #[tokio::test]
    async fn send_surfaces_collector_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let reporter = ErrorReporter::new(Some(Url::parse(&server.uri()).unwrap())).unwrap();
        assert!(reporter.send(&sample_event()).await.is_err());
    }

    #[tokio::test]
    async fn send_without_endpoint_is_a_no_op() {
        let reporter = ErrorReporter::new(None).unwrap();
        assert!(reporter.endpoint().is_none());
        reporter.send(&sample_event()).await.unwrap();
    }
}
