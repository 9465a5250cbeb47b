//! CSRF token issue and enforcement.
//!
//! Tokens come from `GET /api/v1/csrf` and must be echoed in the
//! `X-CSRF-Token` header on every state-changing request. A token stays
//! valid until it expires; it is not consumed by use.

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::http::response::ApiError;

/// Header carrying the token.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Lifetime of an issued token.
pub const CSRF_TOKEN_TTL: Duration = Duration::from_secs(30);

/// Issued, unexpired tokens.
#[derive(Debug)]
pub struct CsrfStore {
    tokens: DashMap<String, Instant>,
    ttl: Duration,
}

impl CsrfStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tokens: DashMap::new(),
            ttl,
        }
    }

    /// Issue a fresh token, dropping expired ones.
    pub fn issue(&self) -> String {
        let now = Instant::now();
        self.tokens.retain(|_, expires| *expires > now);

        let token = Uuid::new_v4().to_string();
        self.tokens.insert(token.clone(), now + self.ttl);
        token
    }

    pub fn verify(&self, token: &str) -> bool {
        match self.tokens.get(token) {
            Some(expires) => *expires > Instant::now(),
            None => false,
        }
    }
}

impl Default for CsrfStore {
    fn default() -> Self {
        Self::new(CSRF_TOKEN_TTL)
    }
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Reject state-changing requests without a valid token.
pub async fn csrf_check(
    State(store): State<Arc<CsrfStore>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if is_safe(request.method()) {
        return next.run(request).await;
    }

    let valid = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|token| store.verify(token))
        .unwrap_or(false);

    if !valid {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "Rejected request with missing or invalid CSRF token"
        );
        return ApiError::Forbidden("invalid CSRF token".to_string()).into_response();
    }

    next.run(request).await
}
