//! CPU usage profile.
//!
//! Samples process CPU time and runtime stats at a fixed interval into a
//! CSV file for the lifetime of the daemon run:
//!
//! ```text
//! elapsed_ms,user_cpu_ms,system_cpu_ms,workers,alive_tasks
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::profiling::diagnostics::RuntimeStats;

const HEADER: &str = "elapsed_ms,user_cpu_ms,system_cpu_ms,workers,alive_tasks\n";

/// Running CPU profile.
pub struct CpuProfiler {
    path: PathBuf,
    stop: CancellationToken,
    task: JoinHandle<io::Result<()>>,
}

impl CpuProfiler {
    /// Create `path` and begin sampling every `interval`.
    pub async fn start(path: &Path, interval: Duration) -> io::Result<Self> {
        let file = File::create(path).await?;
        let stop = CancellationToken::new();
        let task = tokio::spawn(sample_loop(BufWriter::new(file), interval, stop.clone()));

        tracing::info!(path = %path.display(), "CPU profiling started");
        Ok(Self {
            path: path.to_path_buf(),
            stop,
            task,
        })
    }

    /// Stop sampling and flush the profile.
    pub async fn stop(self) -> io::Result<()> {
        self.stop.cancel();
        let result = match self.task.await {
            Ok(res) => res,
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e)),
        };
        tracing::info!(path = %self.path.display(), "CPU profiling stopped");
        result
    }
}

async fn sample_loop(
    mut out: BufWriter<File>,
    interval: Duration,
    stop: CancellationToken,
) -> io::Result<()> {
    let started = Instant::now();
    let mut ticker = tokio::time::interval(interval);
    out.write_all(HEADER.as_bytes()).await?;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                out.write_all(sample_line(started).as_bytes()).await?;
            }
            _ = stop.cancelled() => {
                out.write_all(sample_line(started).as_bytes()).await?;
                break;
            }
        }
    }

    out.flush().await?;
    out.into_inner().sync_all().await
}

fn sample_line(started: Instant) -> String {
    let (user_ms, system_ms) = process_cpu_ms();
    let stats = RuntimeStats::capture();
    format!(
        "{},{},{},{},{}\n",
        started.elapsed().as_millis(),
        user_ms,
        system_ms,
        stats.workers,
        stats.alive_tasks
    )
}

/// User and system CPU time consumed by this process, in milliseconds.
#[cfg(unix)]
pub fn process_cpu_ms() -> (u64, u64) {
    let mut usage = std::mem::MaybeUninit::<libc::rusage>::zeroed();
    // SAFETY: getrusage only writes into the provided struct.
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
    if rc != 0 {
        return (0, 0);
    }
    // SAFETY: rc == 0 means the struct was filled in.
    let usage = unsafe { usage.assume_init() };
    let to_ms = |tv: libc::timeval| (tv.tv_sec as u64) * 1000 + (tv.tv_usec as u64) / 1000;
    (to_ms(usage.ru_utime), to_ms(usage.ru_stime))
}

#[cfg(not(unix))]
pub fn process_cpu_ms() -> (u64, u64) {
    (0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_profile_written_until_stop() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("cpu.prof");

        let profiler = CpuProfiler::start(&path, Duration::from_millis(5)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        profiler.stop().await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some(HEADER.trim_end()));
        assert!(lines.count() >= 2);
    }

    #[tokio::test]
    async fn test_unwritable_path_fails() {
        let res = CpuProfiler::start(Path::new("/nonexistent/dir/cpu.prof"), Duration::from_millis(5)).await;
        assert!(res.is_err());
    }
}
