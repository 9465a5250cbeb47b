//! OS signal handling.
//!
//! # Responsibilities
//! - SIGINT/SIGTERM → trigger the quit notification
//! - SIGUSR1 → log runtime stats and dump the signal task's own backtrace, keep running
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - The daemon never sees signals directly; it only sees `Shutdown`, so it
//!   can be driven by tests without real signals
//! - Listener tasks are fire-and-forget; process exit reclaims them

use crate::lifecycle::Shutdown;
use crate::profiling::diagnostics;

/// Spawn the interrupt and debug-dump listeners.
pub fn spawn_signal_handlers(shutdown: Shutdown) {
    tokio::spawn(catch_interrupt(shutdown));
    #[cfg(unix)]
    tokio::spawn(catch_debug());
}

async fn catch_interrupt(shutdown: Shutdown) {
    match wait_for_interrupt().await {
        Ok(name) => {
            tracing::info!(signal = name, "Shutdown signal received");
            shutdown.trigger();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install interrupt handler");
        }
    }
}

#[cfg(unix)]
async fn wait_for_interrupt() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res.map(|_| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_interrupt() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "CTRL-C")
}

#[cfg(unix)]
async fn catch_debug() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut usr1 = match signal(SignalKind::user_defined1()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install SIGUSR1 handler");
            return;
        }
    };

    while usr1.recv().await.is_some() {
        let stats = diagnostics::RuntimeStats::capture();
        tracing::info!(
            workers = stats.workers,
            alive_tasks = stats.alive_tasks,
            global_queue_depth = stats.global_queue_depth,
            "SIGUSR1 received, dumping diagnostics"
        );
        // Only this task's thread; the stats above cover the rest of the runtime.
        println!("{}", diagnostics::backtrace_dump());
    }
}
