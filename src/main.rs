//! Hardware wallet daemon.
//!
//! Exposes a hardware wallet over a local HTTP API.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser / wallet app
//!              │
//!              ▼
//!     ┌─────────────────────────────────────────────┐
//!     │  http: request ID → trace → metrics         │
//!     │        → host check → CSRF → handlers       │
//!     └──────────────────────┬──────────────────────┘
//!                            ▼
//!     ┌─────────────────────────────────────────────┐
//!     │  gateway (one device call at a time)        │
//!     └──────────────────────┬──────────────────────┘
//!                            ▼
//!     ┌─────────────────────────────────────────────┐
//!     │  device: Skywallet → USB / emulator (UDP)   │
//!     └─────────────────────────────────────────────┘
//!
//!     daemon: signals → Shutdown, log file, profiling, drain, cleanup
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use hardware_wallet_daemon::config::{self, ConfigError, DaemonConfig};
use hardware_wallet_daemon::daemon::Daemon;
use hardware_wallet_daemon::http::HttpServerFactory;
use hardware_wallet_daemon::lifecycle::{signals, Shutdown};
use hardware_wallet_daemon::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "hardware-wallet-daemon")]
#[command(about = "HTTP daemon for the hardware wallet", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address the API listens on
    #[arg(long)]
    web_interface_addr: Option<String>,

    /// Port the API listens on
    #[arg(long)]
    web_interface_port: Option<u16>,

    /// trace, debug, info, warn, error
    #[arg(long)]
    log_level: Option<String>,

    /// Colored stdout logs
    #[arg(long)]
    color_log: Option<bool>,

    /// Also write logs to <data-directory>/logs
    #[arg(long)]
    log_to_file: Option<bool>,

    #[arg(long)]
    data_directory: Option<String>,

    /// Write a CPU profile while running
    #[arg(long)]
    profile_cpu: Option<bool>,

    #[arg(long)]
    profile_cpu_file: Option<String>,

    /// Serve metrics and runtime dumps on --http-prof-host
    #[arg(long)]
    http_prof: Option<bool>,

    #[arg(long)]
    http_prof_host: Option<String>,

    /// Require an X-CSRF-Token header on state-changing requests
    #[arg(long)]
    enable_csrf: Option<bool>,

    /// Skip Host/Origin/Referer checks
    #[arg(long)]
    disable_header_check: Option<bool>,

    /// Comma separated extra allowed hosts (host:port)
    #[arg(long)]
    host_whitelist: Option<String>,

    /// USB or EMULATOR
    #[arg(long)]
    daemon_mode: Option<String>,

    /// Seconds to wait for in-flight requests on shutdown
    #[arg(long)]
    shutdown_timeout_secs: Option<u64>,

    #[arg(long)]
    request_timeout_secs: Option<u64>,
}

impl Cli {
    /// File (or default) configuration with command line values on top.
    fn into_config(self) -> Result<DaemonConfig, ConfigError> {
        let mut cfg = match &self.config {
            Some(path) => config::load_config(path)?,
            None => DaemonConfig::default(),
        };

        let app = &mut cfg.app;
        if let Some(v) = self.web_interface_addr {
            app.web_interface_addr = v;
        }
        if let Some(v) = self.web_interface_port {
            app.web_interface_port = v;
        }
        if let Some(v) = self.log_level {
            app.log_level = v;
        }
        if let Some(v) = self.color_log {
            app.color_log = v;
        }
        if let Some(v) = self.log_to_file {
            app.log_to_file = v;
        }
        if let Some(v) = self.data_directory {
            app.data_directory = v;
        }
        if let Some(v) = self.profile_cpu {
            app.profile_cpu = v;
        }
        if let Some(v) = self.profile_cpu_file {
            app.profile_cpu_file = v;
        }
        if let Some(v) = self.http_prof {
            app.http_prof = v;
        }
        if let Some(v) = self.http_prof_host {
            app.http_prof_host = v;
        }
        if let Some(v) = self.enable_csrf {
            app.enable_csrf = v;
        }
        if let Some(v) = self.disable_header_check {
            app.disable_header_check = v;
        }
        if let Some(v) = self.host_whitelist {
            app.host_whitelist = v;
        }
        if let Some(v) = self.daemon_mode {
            app.daemon_mode = v;
        }
        if let Some(v) = self.shutdown_timeout_secs {
            app.shutdown_timeout_secs = v;
        }
        if let Some(v) = self.request_timeout_secs {
            app.request_timeout_secs = v;
        }

        config::post_process(&mut cfg).map_err(ConfigError::Validation)?;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let log = match logging::init() {
        Ok(control) => Arc::new(control),
        Err(e) => {
            eprintln!("failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = match cli.into_config() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let mut daemon = Daemon::new(config, log, Arc::new(HttpServerFactory));
    match metrics::init_metrics() {
        Ok(handle) => daemon = daemon.with_metrics(handle),
        Err(e) => tracing::warn!(error = %e, "Metrics recorder not installed"),
    }

    let shutdown = Shutdown::new();
    signals::spawn_signal_handlers(shutdown.clone());

    match daemon.run(shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
