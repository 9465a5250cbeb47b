//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Parse and apply the configured log level at runtime
//! - Toggle coloured terminal output
//! - Mirror events into a log file once one is attached
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Level and terminal layer sit behind `reload` handles so the daemon can
//!   apply its configuration after the subscriber is installed
//! - The file layer writes through a shared slot; attaching and detaching a
//!   file never rebuilds the subscriber

use chrono::{DateTime, Local};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self as tracing_fmt, MakeWriter},
    layer::{Layered, SubscriberExt},
    reload,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter, Registry,
};

use crate::config::ConfigError;

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" | "fatal" | "panic" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        f.write_str(name)
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// Runtime control over the logging subsystem.
pub trait LogControl: Send + Sync {
    fn set_level(&self, level: LogLevel);

    fn set_colors(&self, enabled: bool);

    /// Start mirroring log events into `file`.
    fn attach_file(&self, file: File);

    /// Stop mirroring and hand the file back to the caller.
    fn detach_file(&self) -> Option<File>;
}

/// Shared destination for the file layer.
///
/// Writes are dropped while no file is attached.
#[derive(Clone, Default)]
pub struct FileHook {
    slot: Arc<Mutex<Option<File>>>,
}

impl FileHook {
    fn lock(&self) -> MutexGuard<'_, Option<File>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn attach(&self, file: File) {
        *self.lock() = Some(file);
    }

    pub fn detach(&self) -> Option<File> {
        self.lock().take()
    }
}

impl Write for FileHook {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.lock().as_mut() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        // One lock per event keeps lines from different threads whole.
        match self.lock().as_mut() {
            Some(file) => file.write_all(buf),
            None => Ok(()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.lock().as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for FileHook {
    type Writer = FileHook;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

type LevelLayer = reload::Layer<LevelFilter, Registry>;
type Base = Layered<LevelLayer, Registry>;
type StdoutLayer = tracing_fmt::Layer<Base>;

/// `LogControl` backed by the global tracing subscriber.
pub struct TracingLogControl {
    level: reload::Handle<LevelFilter, Registry>,
    stdout: reload::Handle<StdoutLayer, Base>,
    file: FileHook,
}

impl LogControl for TracingLogControl {
    fn set_level(&self, level: LogLevel) {
        if let Err(e) = self.level.reload(LevelFilter::from(level)) {
            eprintln!("failed to apply log level {}: {}", level, e);
        }
    }

    fn set_colors(&self, enabled: bool) {
        let result = self
            .stdout
            .modify(|layer| *layer = tracing_fmt::layer().with_ansi(enabled));
        if let Err(e) = result {
            eprintln!("failed to toggle log colours: {}", e);
        }
    }

    fn attach_file(&self, file: File) {
        self.file.attach(file);
    }

    fn detach_file(&self) -> Option<File> {
        self.file.detach()
    }
}

/// Install the global subscriber.
///
/// Starts at INFO with colours on; the daemon applies the configured values
/// when it runs. `RUST_LOG` further narrows per-crate output.
pub fn init() -> Result<TracingLogControl, TryInitError> {
    let (level_layer, level) = reload::Layer::new(LevelFilter::INFO);
    let (stdout_layer, stdout) = reload::Layer::new(tracing_fmt::layer().with_ansi(true));
    let file = FileHook::default();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trace,hyper=info,h2=info,reqwest=info"));

    tracing_subscriber::registry()
        .with(level_layer)
        .with(stdout_layer)
        .with(
            tracing_fmt::layer()
                .with_ansi(false)
                .with_writer(file.clone()),
        )
        .with(env_filter)
        .try_init()?;

    Ok(TracingLogControl { level, stdout, file })
}

/// Log file name for a run started at `now`: `YYYY-MM-DD-HHMMSS.log`.
pub fn log_file_name(now: DateTime<Local>) -> String {
    format!("{}.log", now.format("%Y-%m-%d-%H%M%S"))
}

/// Create `log_dir` if needed and open a fresh append-only log file in it.
pub fn create_log_file(log_dir: &Path, now: DateTime<Local>) -> io::Result<(PathBuf, File)> {
    create_dir_if_not_exist(log_dir)?;

    let path = log_dir.join(log_file_name(now));
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let file = options.open(&path)?;
    Ok((path, file))
}

fn create_dir_if_not_exist(dir: &Path) -> io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o750);
    }
    builder.create(dir)
}
