//! Errors returned by a daemon run.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::ConfigError;
use crate::device::DeviceError;

/// Fatal error ending `Daemon::run`.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Invalid configuration; nothing was started.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A file or directory the daemon needs could not be created.
    #[error("{action}({}) failed: {source}", .path.display())]
    Resource {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The device handle or API server could not be set up.
    #[error("{0}")]
    ServerConstruction(String),

    /// The serve loop failed after a successful start.
    #[error(transparent)]
    Serve(#[from] ServeError),
}

impl DaemonError {
    pub fn resource(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DaemonError::Resource {
            action,
            path: path.into(),
            source,
        }
    }
}

impl From<DeviceError> for DaemonError {
    fn from(e: DeviceError) -> Self {
        DaemonError::ServerConstruction(e.to_string())
    }
}

/// Runtime failure of the API serve loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServeError {
    #[error("api server i/o error: {0}")]
    Io(String),

    /// `serve` was called on a server that already served.
    #[error("api server already started")]
    AlreadyStarted,
}

impl From<std::io::Error> for ServeError {
    fn from(e: std::io::Error) -> Self {
        ServeError::Io(e.to_string())
    }
}
