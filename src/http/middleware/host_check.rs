//! Host, Origin and Referer header checks.
//!
//! Guards a localhost-bound API against DNS rebinding and cross-origin
//! browser requests. A request passes when its `Host` header names the
//! bound address, a loopback name on the bound port, or a whitelisted host;
//! `Origin` and `Referer`, when present, must name an allowed host too.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::http::response::ApiError;

/// Hosts accepted by the check, lower-cased `host:port` strings.
#[derive(Debug, Clone)]
pub struct AllowedHosts {
    hosts: HashSet<String>,
}

impl AllowedHosts {
    pub fn new(bound: SocketAddr, whitelist: &[String]) -> Self {
        let port = bound.port();
        let mut hosts: HashSet<String> = ["localhost", "127.0.0.1", "[::1]"]
            .iter()
            .map(|h| format!("{}:{}", h, port))
            .collect();
        hosts.insert(bound.to_string());
        hosts.extend(whitelist.iter().map(|h| h.to_ascii_lowercase()));
        Self { hosts }
    }

    pub fn contains(&self, host: &str) -> bool {
        self.hosts.contains(&host.to_ascii_lowercase())
    }

    /// Check the `Host`, `Origin` and `Referer` headers.
    pub fn check(&self, headers: &HeaderMap) -> Result<(), String> {
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| "missing Host header".to_string())?;
        if !self.contains(host) {
            return Err(format!("invalid Host header: {}", host));
        }

        for name in [header::ORIGIN, header::REFERER] {
            if let Some(value) = headers.get(&name) {
                let value = value.to_str().unwrap_or_default();
                match authority_of(value) {
                    Some(authority) if self.contains(&authority) => {}
                    _ => return Err(format!("invalid {} header: {}", name, value)),
                }
            }
        }
        Ok(())
    }
}

/// `host:port` of an absolute URL, filling in the scheme's default port.
fn authority_of(url: &str) -> Option<String> {
    let uri: Uri = url.parse().ok()?;
    let authority = uri.authority()?;
    let port = match authority.port_u16() {
        Some(p) => p,
        None => match uri.scheme_str() {
            Some("https") => 443,
            Some("http") => 80,
            _ => return None,
        },
    };
    Some(format!("{}:{}", authority.host(), port))
}

pub async fn host_check(
    State(allowed): State<Arc<AllowedHosts>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if let Err(reason) = allowed.check(request.headers()) {
        tracing::warn!(path = %request.uri().path(), reason = %reason, "Rejected request by header check");
        return ApiError::Forbidden(reason).into_response();
    }
    next.run(request).await
}
