//! Request middleware for the API router.
//!
//! - csrf.rs: token store and `X-CSRF-Token` enforcement
//! - host_check.rs: Host/Origin/Referer validation

pub mod csrf;
pub mod host_check;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::observability::metrics;

pub use csrf::{csrf_check, CsrfStore, CSRF_HEADER};
pub use host_check::{host_check, AllowedHosts};

/// Record count and latency per matched route.
pub async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, &path, response.status().as_u16(), start);
    response
}
