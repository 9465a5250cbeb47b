//! Metrics collection and exposition.
//!
//! # Metrics
//! - `hwd_requests_total` (counter): API requests by method, path, status
//! - `hwd_request_duration_seconds` (histogram): API latency
//! - `hwd_device_calls_total` (counter): device calls by operation, outcome
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library users
//!   and tests pay nothing
//! - The Prometheus rendering is served by the diagnostics listener

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Install the global Prometheus recorder.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::debug!("Prometheus recorder installed");
    Ok(handle)
}

/// Record a completed API request.
pub fn record_request(method: &str, path: &str, status: u16, start_time: Instant) {
    let duration = start_time.elapsed().as_secs_f64();
    let status_str = status.to_string();

    counter!(
        "hwd_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .increment(1);

    histogram!(
        "hwd_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration);
}

/// Record the outcome of a device call.
pub fn record_device_call(op: &'static str, outcome: &'static str) {
    counter!("hwd_device_calls_total", "op" => op, "outcome" => outcome).increment(1);
}
