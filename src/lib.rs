//! Hardware wallet daemon library.

// Core subsystems
pub mod config;
pub mod daemon;
pub mod device;
pub mod http;
pub mod models;

// Cross-cutting concerns
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod profiling;

pub use config::DaemonConfig;
pub use daemon::Daemon;
pub use error::{DaemonError, ServeError};
pub use lifecycle::Shutdown;
