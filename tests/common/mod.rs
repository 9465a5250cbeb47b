//! Shared fakes for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::fs::File;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use hardware_wallet_daemon::config::DaemonConfig;
use hardware_wallet_daemon::device::{Device, DeviceError, Features, SignInput, SignOutput};
use hardware_wallet_daemon::error::{DaemonError, ServeError};
use hardware_wallet_daemon::http::{ApiConfig, ApiServer, Gateway, ServerFactory};
use hardware_wallet_daemon::observability::{LogControl, LogLevel};

/// Config with file logging into `dir` and a fast shutdown deadline.
pub fn test_config(dir: &std::path::Path) -> DaemonConfig {
    let mut config = DaemonConfig::default();
    config.app.data_directory = dir.to_string_lossy().into_owned();
    config.app.log_to_file = true;
    config.app.shutdown_timeout_secs = 2;
    hardware_wallet_daemon::config::post_process(&mut config).unwrap();
    config
}

/// How a fake server's `serve` behaves.
#[derive(Debug, Clone)]
pub enum ServeBehaviour {
    /// Block until `shutdown` is called, then return `Ok`.
    UntilShutdown,
    /// Fail with the given error after a delay.
    FailAfter(Duration, ServeError),
    /// Never return, even after `shutdown`.
    Hang,
}

/// Observations shared by a factory and the servers it builds.
#[derive(Debug, Default)]
pub struct Calls {
    pub create: AtomicUsize,
    pub serve: AtomicUsize,
    pub shutdown: AtomicUsize,
    pub serve_exited: AtomicBool,
}

pub struct FakeServer {
    behaviour: ServeBehaviour,
    calls: Arc<Calls>,
    stop: CancellationToken,
}

struct ExitFlag(Arc<Calls>);

impl Drop for ExitFlag {
    fn drop(&mut self) {
        self.0.serve_exited.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ApiServer for FakeServer {
    fn local_addr(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    async fn serve(&self) -> Result<(), ServeError> {
        self.calls.serve.fetch_add(1, Ordering::SeqCst);
        let _exit = ExitFlag(self.calls.clone());
        match &self.behaviour {
            ServeBehaviour::UntilShutdown => {
                self.stop.cancelled().await;
                Ok(())
            }
            ServeBehaviour::FailAfter(delay, err) => {
                tokio::time::sleep(*delay).await;
                Err(err.clone())
            }
            ServeBehaviour::Hang => std::future::pending().await,
        }
    }

    async fn shutdown(&self) {
        self.calls.shutdown.fetch_add(1, Ordering::SeqCst);
        self.stop.cancel();
    }
}

pub struct FakeServerFactory {
    pub calls: Arc<Calls>,
    behaviour: ServeBehaviour,
    fail_with: Option<String>,
}

impl FakeServerFactory {
    pub fn serving(behaviour: ServeBehaviour) -> Self {
        Self {
            calls: Arc::new(Calls::default()),
            behaviour,
            fail_with: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            calls: Arc::new(Calls::default()),
            behaviour: ServeBehaviour::UntilShutdown,
            fail_with: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl ServerFactory for FakeServerFactory {
    async fn create(
        &self,
        _host: &str,
        _config: ApiConfig,
        _gateway: Gateway,
    ) -> Result<Arc<dyn ApiServer>, DaemonError> {
        self.calls.create.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.fail_with {
            return Err(DaemonError::ServerConstruction(message.clone()));
        }
        Ok(Arc::new(FakeServer {
            behaviour: self.behaviour.clone(),
            calls: self.calls.clone(),
            stop: CancellationToken::new(),
        }))
    }
}

/// `LogControl` that records what the daemon asked of it.
#[derive(Debug, Default)]
pub struct RecordingLogControl {
    pub levels: Mutex<Vec<LogLevel>>,
    pub colors: Mutex<Vec<bool>>,
    pub attached: AtomicUsize,
    pub closed: AtomicUsize,
    file: Mutex<Option<File>>,
}

impl RecordingLogControl {
    pub fn attached(&self) -> usize {
        self.attached.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl LogControl for RecordingLogControl {
    fn set_level(&self, level: LogLevel) {
        self.levels.lock().unwrap().push(level);
    }

    fn set_colors(&self, enabled: bool) {
        self.colors.lock().unwrap().push(enabled);
    }

    fn attach_file(&self, file: File) {
        self.attached.fetch_add(1, Ordering::SeqCst);
        *self.file.lock().unwrap() = Some(file);
    }

    fn detach_file(&self) -> Option<File> {
        let file = self.file.lock().unwrap().take();
        if file.is_some() {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
        file
    }
}

/// In-memory device with canned answers.
#[derive(Debug, Default)]
pub struct MockDevice {
    pub connected: bool,
    pub calls: AtomicUsize,
}

impl MockDevice {
    pub fn connected() -> Self {
        Self {
            connected: true,
            calls: AtomicUsize::new(0),
        }
    }

    fn check(&self) -> Result<(), DeviceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.connected {
            Ok(())
        } else {
            Err(DeviceError::NotConnected("mock device unplugged".to_string()))
        }
    }
}

#[async_trait]
impl Device for MockDevice {
    async fn available(&self) -> bool {
        self.connected
    }

    async fn features(&self) -> Result<Features, DeviceError> {
        self.check()?;
        Ok(Features {
            vendor: "Skycoin Foundation".to_string(),
            device_id: "mock-0001".to_string(),
            firmware_version: "1.7.0".to_string(),
            label: Some("mock".to_string()),
            initialized: true,
            pin_protection: false,
            passphrase_protection: false,
            needs_backup: false,
        })
    }

    async fn generate_addresses(
        &self,
        count: u32,
        start_index: u32,
        _confirm: bool,
    ) -> Result<Vec<String>, DeviceError> {
        self.check()?;
        Ok((start_index..start_index + count).map(|i| format!("addr{}", i)).collect())
    }

    async fn sign_message(&self, address_index: u32, message: &str) -> Result<String, DeviceError> {
        self.check()?;
        Ok(format!("sig:{}:{}", address_index, message))
    }

    async fn check_message_signature(
        &self,
        address: &str,
        _message: &str,
        signature: &str,
    ) -> Result<String, DeviceError> {
        self.check()?;
        if signature.starts_with("sig:") {
            Ok(address.to_string())
        } else {
            Err(DeviceError::Failure("invalid signature".to_string()))
        }
    }

    async fn transaction_sign(
        &self,
        inputs: Vec<SignInput>,
        _outputs: Vec<SignOutput>,
    ) -> Result<Vec<String>, DeviceError> {
        self.check()?;
        Ok(inputs.iter().map(|i| format!("sig:{}", i.hash)).collect())
    }

    async fn wipe(&self) -> Result<(), DeviceError> {
        self.check()
    }

    async fn cancel(&self) -> Result<(), DeviceError> {
        self.check()
    }
}
