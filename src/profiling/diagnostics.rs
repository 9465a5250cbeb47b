//! Diagnostic HTTP listener.
//!
//! # Responsibilities
//! - `/metrics`: Prometheus text rendering
//! - `/debug/runtime`: tokio runtime stats as JSON
//! - `/debug/backtrace`: backtrace of the worker thread handling the request
//!
//! # Design Decisions
//! - Non-essential tooling: bind or serve failures are logged, never fatal
//! - Fire-and-forget task; it stops with the quit notification

use axum::{extract::State, routing::get, Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::lifecycle::Shutdown;

/// Snapshot of the async runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeStats {
    pub workers: usize,
    pub alive_tasks: usize,
    pub global_queue_depth: usize,
}

impl RuntimeStats {
    /// Capture stats of the current runtime, zeros outside one.
    pub fn capture() -> Self {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let metrics = handle.metrics();
                Self {
                    workers: metrics.num_workers(),
                    alive_tasks: metrics.num_alive_tasks(),
                    global_queue_depth: metrics.global_queue_depth(),
                }
            }
            Err(_) => Self::default(),
        }
    }
}

/// Backtrace of the calling thread.
///
/// Other runtime threads and parked tasks are not included; `RuntimeStats`
/// is the view of the whole runtime.
pub fn backtrace_dump() -> String {
    format!(
        "thread {:?} backtrace:\n{}",
        std::thread::current().name().unwrap_or("<unnamed>"),
        std::backtrace::Backtrace::force_capture()
    )
}

#[derive(Clone)]
struct DiagnosticsState {
    metrics: Option<PrometheusHandle>,
}

/// Router serving the diagnostic endpoints.
pub fn router(metrics: Option<PrometheusHandle>) -> Router {
    Router::new()
        .route("/metrics", get(render_metrics))
        .route("/debug/runtime", get(runtime_stats))
        .route("/debug/backtrace", get(backtrace))
        .with_state(DiagnosticsState { metrics })
}

async fn render_metrics(State(state): State<DiagnosticsState>) -> String {
    state
        .metrics
        .as_ref()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}

async fn runtime_stats() -> Json<RuntimeStats> {
    Json(RuntimeStats::capture())
}

async fn backtrace() -> String {
    backtrace_dump()
}

/// Serve the diagnostic endpoints on `host` in the background.
///
/// The task ends on its own if `host` cannot be bound.
pub fn spawn(host: String, metrics: Option<PrometheusHandle>, shutdown: Shutdown) -> JoinHandle<()> {
    tokio::spawn(async move {
        let listener = match TcpListener::bind(&host).await {
            Ok(l) => l,
            Err(e) => {
                tracing::error!(host = %host, error = %e, "Listen on HTTP profiling interface failed");
                return;
            }
        };
        tracing::info!(host = %host, "Diagnostics listener started");

        let result = axum::serve(listener, router(metrics))
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await;
        if let Err(e) = result {
            tracing::error!(host = %host, error = %e, "HTTP profiling interface failed");
        }
    })
}
