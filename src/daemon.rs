//! Lifecycle coordinator.
//!
//! # Responsibilities
//! - Apply logging settings and open the log file
//! - Start optional CPU profiling and the diagnostics listener
//! - Build the device handle and API server, run the serve loop on a task
//! - Wait for the quit notification or a serve failure, then shut down
//!
//! # Data Flow
//! ```text
//! run(shutdown)
//!     → Configuring: parse log level, attach log file, profilers
//!     → Starting: new_device, ServerFactory::create
//!     → Running: serve task, select! { quit, serve error }
//!     → ShuttingDown: Resources::release
//!         server.shutdown → join worker → stop profiler → close log file
//!     → Terminated
//! ```
//!
//! # Design Decisions
//! - Everything acquired during start-up is recorded in `Resources`, and
//!   `release` runs on every exit path, so a failed start cleans up exactly
//!   what it acquired
//! - Drain is bounded by `shutdown_timeout_secs`; the serve task is aborted
//!   once the deadline passes
//! - The first error wins; cleanup failures are logged, not returned

use chrono::Local;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::DaemonConfig;
use crate::device;
use crate::error::{DaemonError, ServeError};
use crate::http::{ApiConfig, ApiServer, Gateway, ServerFactory};
use crate::lifecycle::{LifecycleState, Shutdown, StateTracker};
use crate::observability::logging::{self, LogControl, LogLevel};
use crate::profiling::{diagnostics, CpuProfiler};

/// Sampling interval of the CPU profile.
const PROFILE_INTERVAL: Duration = Duration::from_millis(100);

/// Capacity of the serve error channel.
const ERROR_CHANNEL_CAPACITY: usize = 10;

/// Drives one run of the daemon from configuration to termination.
pub struct Daemon {
    config: DaemonConfig,
    log: Arc<dyn LogControl>,
    factory: Arc<dyn ServerFactory>,
    metrics: Option<PrometheusHandle>,
    state: Arc<StateTracker>,
}

impl Daemon {
    pub fn new(config: DaemonConfig, log: Arc<dyn LogControl>, factory: Arc<dyn ServerFactory>) -> Self {
        Self {
            config,
            log,
            factory,
            metrics: None,
            state: Arc::new(StateTracker::new()),
        }
    }

    /// Expose `handle` on the diagnostics listener's `/metrics`.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn state(&self) -> Arc<StateTracker> {
        self.state.clone()
    }

    /// Run until `shutdown` fires or the serve loop fails.
    ///
    /// Returns the first error encountered. Every resource acquired on the
    /// way up is released before returning, whichever way the run ends.
    pub async fn run(&self, shutdown: Shutdown) -> Result<(), DaemonError> {
        self.state.advance(LifecycleState::Configuring);

        let mut resources = Resources::default();
        let result = self.start(&shutdown, &mut resources).await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Daemon run failed");
        }

        self.state.advance(LifecycleState::ShuttingDown);
        resources.release(self.log.as_ref(), self.shutdown_timeout()).await;
        self.state.advance(LifecycleState::Terminated);

        result
    }

    fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.config.app.shutdown_timeout_secs)
    }

    async fn start(&self, shutdown: &Shutdown, res: &mut Resources) -> Result<(), DaemonError> {
        let app = &self.config.app;

        let level: LogLevel = app.log_level.parse()?;
        self.log.set_level(level);
        self.log.set_colors(app.color_log);

        if app.log_to_file {
            let dir = app.log_directory();
            let (path, file) = logging::create_log_file(&dir, Local::now())
                .map_err(|e| DaemonError::resource("create log file", &dir, e))?;
            self.log.attach_file(file);
            tracing::info!(path = %path.display(), "Logging to file");
            res.log_file = Some(path);
        }

        tracing::info!(
            version = %self.config.build.version,
            commit = %self.config.build.commit,
            branch = %self.config.build.branch,
            mode = %app.mode(),
            level = %level,
            "Daemon starting"
        );

        if app.profile_cpu {
            let path = PathBuf::from(&app.profile_cpu_file);
            let profiler = CpuProfiler::start(&path, PROFILE_INTERVAL)
                .await
                .map_err(|e| DaemonError::resource("create cpu profile", &path, e))?;
            res.profiler = Some(profiler);
        }

        if app.http_prof {
            let diag = shutdown.child();
            let task = diagnostics::spawn(app.http_prof_host.clone(), self.metrics.clone(), diag.clone());
            res.diagnostics = Some((diag, task));
        }

        self.state.advance(LifecycleState::Starting);

        let device = device::new_device(app.mode());
        let host = app.host();
        let server = self
            .factory
            .create(&host, ApiConfig::from_config(&self.config), Gateway::new(device))
            .await?;
        res.server = Some(server.clone());

        let (err_tx, mut err_rx) = mpsc::channel::<ServeError>(ERROR_CHANNEL_CAPACITY);
        res.worker = Some(tokio::spawn(async move {
            if let Err(e) = server.serve().await {
                tracing::error!(error = %e, "API server failed");
                let _ = err_tx.send(e).await;
            }
        }));

        self.state.advance(LifecycleState::Running);
        tracing::info!(host = %host, "Daemon running");

        tokio::select! {
            _ = shutdown.wait() => {
                tracing::info!("Shutting down...");
                Ok(())
            }
            received = err_rx.recv() => match received {
                Some(e) => {
                    tracing::info!("Shutting down...");
                    Err(DaemonError::Serve(e))
                }
                None => {
                    tracing::warn!("API server exited");
                    Ok(())
                }
            },
        }
    }
}

/// Everything a run has acquired and must give back.
#[derive(Default)]
struct Resources {
    log_file: Option<PathBuf>,
    profiler: Option<CpuProfiler>,
    diagnostics: Option<(Shutdown, JoinHandle<()>)>,
    server: Option<Arc<dyn ApiServer>>,
    worker: Option<JoinHandle<()>>,
}

impl Resources {
    /// Release in order: server, worker, diagnostics, profiler, log file.
    async fn release(self, log: &dyn LogControl, timeout: Duration) {
        let deadline = Instant::now() + timeout;

        if let Some(server) = self.server {
            tracing::info!("Closing api server");
            if tokio::time::timeout_at(deadline, server.shutdown()).await.is_err() {
                tracing::warn!(timeout_secs = timeout.as_secs(), "API server drain timed out");
            }
        }

        if let Some(mut worker) = self.worker {
            tracing::info!("Waiting for tasks to finish");
            match tokio::time::timeout_at(deadline, &mut worker).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "API server task failed"),
                Err(_) => {
                    tracing::warn!("API server task still running, aborting");
                    worker.abort();
                    let _ = worker.await;
                }
            }
        }

        if let Some((diag, mut task)) = self.diagnostics {
            diag.trigger();
            if tokio::time::timeout_at(deadline, &mut task).await.is_err() {
                tracing::warn!("Diagnostics listener still running, aborting");
                task.abort();
            }
        }

        if let Some(profiler) = self.profiler {
            if let Err(e) = profiler.stop().await {
                tracing::error!(error = %e, "Failed to write CPU profile");
            }
        }

        tracing::info!("Goodbye");

        if let Some(path) = self.log_file {
            if let Some(file) = log.detach_file() {
                if let Err(e) = file.sync_all() {
                    tracing::error!(path = %path.display(), error = %e, "Failed to sync log file");
                }
            }
        }
    }
}
