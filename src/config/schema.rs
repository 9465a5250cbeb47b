//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the daemon.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::device::DaemonMode;

/// Root configuration for the hardware wallet daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DaemonConfig {
    /// Application settings.
    pub app: AppConfig,

    /// Build metadata reported by `/api/v1/version`.
    pub build: BuildInfo,
}

/// Application settings.
///
/// `daemon_mode` and `host_whitelist` are kept in their raw string form as
/// read from the file or command line; `post_process` fills in the parsed
/// counterparts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the API listens on.
    pub web_interface_addr: String,

    /// Port the API listens on.
    pub web_interface_port: u16,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Colourise terminal log output.
    pub color_log: bool,

    /// Mirror logs into `<data_directory>/logs/`.
    pub log_to_file: bool,

    /// Directory for daemon state. A leading `~` is expanded.
    pub data_directory: String,

    /// Sample CPU usage into `profile_cpu_file` while running.
    pub profile_cpu: bool,

    /// Destination of the CPU profile.
    pub profile_cpu_file: String,

    /// Serve the diagnostics endpoint on `http_prof_host`.
    pub http_prof: bool,

    /// Diagnostics endpoint bind address.
    pub http_prof_host: String,

    /// Require CSRF tokens on state-changing requests.
    pub enable_csrf: bool,

    /// Skip Host/Origin header checks.
    pub disable_header_check: bool,

    /// Comma separated list of additional allowed Host values.
    pub host_whitelist: String,

    /// Device mode: `USB` or `EMULATOR`.
    pub daemon_mode: String,

    /// Upper bound on draining the API server during shutdown.
    pub shutdown_timeout_secs: u64,

    /// Per-request timeout for API calls.
    pub request_timeout_secs: u64,

    #[serde(skip)]
    pub(crate) parsed_mode: DaemonMode,

    #[serde(skip)]
    pub(crate) parsed_whitelist: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            web_interface_addr: "127.0.0.1".to_string(),
            web_interface_port: 9510,
            log_level: "INFO".to_string(),
            color_log: true,
            log_to_file: false,
            data_directory: "~/.skycoin-hw-daemon".to_string(),
            profile_cpu: false,
            profile_cpu_file: "cpu.prof".to_string(),
            http_prof: false,
            http_prof_host: "localhost:6060".to_string(),
            enable_csrf: true,
            disable_header_check: false,
            host_whitelist: String::new(),
            daemon_mode: "USB".to_string(),
            shutdown_timeout_secs: 30,
            request_timeout_secs: 60,
            parsed_mode: DaemonMode::Usb,
            parsed_whitelist: Vec::new(),
        }
    }
}

impl AppConfig {
    /// `host:port` the API server binds to.
    pub fn host(&self) -> String {
        format!("{}:{}", self.web_interface_addr, self.web_interface_port)
    }

    /// Device mode, valid after `post_process`.
    pub fn mode(&self) -> DaemonMode {
        self.parsed_mode
    }

    /// Whitelisted hosts, valid after `post_process`.
    pub fn whitelist(&self) -> &[String] {
        &self.parsed_whitelist
    }

    /// Directory receiving log files.
    pub fn log_directory(&self) -> PathBuf {
        PathBuf::from(&self.data_directory).join("logs")
    }
}

/// Build metadata.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BuildInfo {
    pub version: String,
    pub commit: String,
    pub branch: String,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: option_env!("HWD_GIT_COMMIT").unwrap_or_default().to_string(),
            branch: option_env!("HWD_GIT_BRANCH").unwrap_or_default().to_string(),
        }
    }
}
