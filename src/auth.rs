//! # Authentication
//!
//! Bearer-token authentication for every API route. A token is accepted when it
//! matches one of the configured static tokens or when the external identity
//! service recognises it. Identity-service answers are cached for a short TTL.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use lru::LruCache;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized};
use crate::ids::to_safe_id_string;

/// The caller behind an accepted bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Why a token was not accepted
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid bearer token")]
    Rejected,
    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Rejected => unauthorized(Some("Invalid bearer token")),
            AuthError::Unavailable(reason) => {
                tracing::warn!(%reason, "Identity service unavailable");
                ApiError::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "IDENTITY_SERVICE_UNAVAILABLE",
                    "Identity service is unavailable",
                )
            }
        }
    }
}

/// Decides whether a bearer token is acceptable
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError>;
}

pub type SharedVerifier = Arc<dyn TokenVerifier>;

/// Accepts a fixed set of tokens, compared in constant time
pub struct StaticTokenVerifier {
    tokens: Vec<String>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let matched = self
            .tokens
            .iter()
            .position(|configured| bool::from(token.as_bytes().ct_eq(configured.as_bytes())));

        match matched {
            Some(index) => Ok(Principal {
                id: format!("api-token-{}", index + 1),
                email: None,
            }),
            None => Err(AuthError::Rejected),
        }
    }
}

/// Validates tokens against `GET {base}/user` on the identity service
pub struct IdentityServiceVerifier {
    client: Client,
    user_url: String,
    ttl: Duration,
    cache: Arc<RwLock<LruCache<String, (Principal, Instant)>>>,
}

impl IdentityServiceVerifier {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        ttl: Duration,
        capacity: usize,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            client,
            user_url: format!("{}/user", base_url.trim_end_matches('/')),
            ttl,
            cache: Arc::new(RwLock::new(LruCache::new(capacity))),
        })
    }

    async fn cached(&self, token: &str) -> Option<Principal> {
        let mut cache = self.cache.write().await;
        match cache.get(token) {
            Some((principal, stored_at)) if stored_at.elapsed() < self.ttl => Some(principal.clone()),
            Some(_) => {
                cache.pop(token);
                None
            }
            None => None,
        }
    }

    async fn fetch(&self, token: &str) -> Result<Principal, AuthError> {
        let response = self
            .client
            .get(&self.user_url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(AuthError::Rejected);
        }
        if !status.is_success() {
            return Err(AuthError::Unavailable(format!("unexpected status {status}")));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(format!("malformed user response: {e}")))?;
        let user = body.get("user").unwrap_or(&body);

        let id = user
            .get("id")
            .and_then(to_safe_id_string)
            .ok_or_else(|| AuthError::Unavailable("user response has no id".to_string()))?;
        let email = user
            .get("email")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Ok(Principal { id, email })
    }
}

#[async_trait]
impl TokenVerifier for IdentityServiceVerifier {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        if let Some(principal) = self.cached(token).await {
            return Ok(principal);
        }

        let principal = self.fetch(token).await?;
        self.cache
            .write()
            .await
            .put(token.to_string(), (principal.clone(), Instant::now()));

        Ok(principal)
    }
}

/// Tries each verifier in order. An outage of one verifier only surfaces
/// when no other verifier accepts the token.
pub struct ChainedVerifier {
    verifiers: Vec<SharedVerifier>,
}

impl ChainedVerifier {
    pub fn new(verifiers: Vec<SharedVerifier>) -> Self {
        Self { verifiers }
    }

    /// Static tokens first, then the identity service, as configured
    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let mut verifiers: Vec<SharedVerifier> = Vec::new();

        if !config.api_tokens.is_empty() {
            verifiers.push(Arc::new(StaticTokenVerifier::new(config.api_tokens.clone())));
        }

        if let Some(url) = config.identity.service_url.as_deref() {
            verifiers.push(Arc::new(IdentityServiceVerifier::new(
                url,
                Duration::from_millis(config.identity.timeout_ms),
                Duration::from_secs(config.identity.cache_ttl_seconds),
                config.identity.cache_capacity,
            )?));
        }

        Ok(Self::new(verifiers))
    }
}

#[async_trait]
impl TokenVerifier for ChainedVerifier {
    async fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let mut outcome = Err(AuthError::Rejected);

        for verifier in &self.verifiers {
            match verifier.verify(token).await {
                Ok(principal) => return Ok(principal),
                Err(AuthError::Unavailable(reason)) => outcome = Err(AuthError::Unavailable(reason)),
                Err(AuthError::Rejected) => {}
            }
        }

        outcome
    }
}

/// Authentication middleware that validates the bearer token and stores the
/// resulting [`Principal`] in the request extensions
pub async fn auth_middleware(
    State(verifier): State<SharedVerifier>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?.to_string();
    let principal = verifier.verify(&token).await?;

    tracing::info!(principal_id = %principal.id, "Authenticated request");
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))?
        .trim();

    if token.is_empty() {
        return Err(unauthorized(Some("Empty bearer token")));
    }
    Ok(token)
}
