//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events: stdout + optional log file)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → terminal, `<data_dir>/logs/*.log`
//!     → diagnostics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::{LogControl, LogLevel, TracingLogControl};
