//! Request/response transports to a device.
//!
//! # Responsibilities
//! - Carry one request to the device and return its single response
//! - Report whether anything is listening on the other end
//!
//! # Design Decisions
//! - One outstanding request per transport; callers serialise access
//! - The emulator speaks one JSON datagram per message over UDP
//! - USB HID access is provided outside this crate; `UsbTransport` only
//!   reports that no device is attached

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;

use crate::device::types::{DeviceError, Features, SignInput, SignOutput};

/// Default emulator UDP port on localhost.
pub const EMULATOR_PORT: u16 = 21324;

/// Largest datagram accepted from the emulator.
const MAX_DATAGRAM: usize = 64 * 1024;

/// A message sent to the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceRequest {
    Ping,
    GetFeatures,
    GenerateAddresses { count: u32, start_index: u32, confirm: bool },
    SignMessage { address_index: u32, message: String },
    CheckMessageSignature { address: String, message: String, signature: String },
    TransactionSign { inputs: Vec<SignInput>, outputs: Vec<SignOutput> },
    Wipe,
    Cancel,
}

/// A message received from the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceResponse {
    Success { message: Option<String> },
    Failure { code: FailureCode, message: String },
    Features(Features),
    Addresses { addresses: Vec<String> },
    Signatures { signatures: Vec<String> },
}

/// Failure classes reported by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    ActionCancelled,
    DataError,
    Other,
}

impl DeviceResponse {
    /// Turn a `Failure` response into a `DeviceError`.
    pub fn into_result(self) -> Result<DeviceResponse, DeviceError> {
        match self {
            DeviceResponse::Failure { code: FailureCode::ActionCancelled, .. } => {
                Err(DeviceError::Cancelled)
            }
            DeviceResponse::Failure { code: FailureCode::DataError, message } => {
                Err(DeviceError::InvalidArgument(message))
            }
            DeviceResponse::Failure { code: FailureCode::Other, message } => {
                Err(DeviceError::Failure(message))
            }
            other => Ok(other),
        }
    }
}

/// A channel to a single device.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and wait for its response.
    async fn exchange(&self, request: &DeviceRequest) -> Result<DeviceResponse, DeviceError>;

    /// Whether a device answers on this transport.
    async fn connected(&self) -> bool {
        matches!(
            self.exchange(&DeviceRequest::Ping).await,
            Ok(DeviceResponse::Success { .. })
        )
    }
}

/// Transport to the firmware emulator over UDP.
#[derive(Debug, Clone)]
pub struct EmulatorTransport {
    addr: SocketAddr,
    read_timeout: Duration,
}

impl EmulatorTransport {
    pub fn new(addr: SocketAddr, read_timeout: Duration) -> Self {
        Self { addr, read_timeout }
    }
}

impl Default for EmulatorTransport {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], EMULATOR_PORT)), Duration::from_secs(5))
    }
}

#[async_trait]
impl Transport for EmulatorTransport {
    async fn exchange(&self, request: &DeviceRequest) -> Result<DeviceResponse, DeviceError> {
        let bind: SocketAddr = if self.addr.is_ipv4() {
            SocketAddr::from(([127, 0, 0, 1], 0))
        } else {
            SocketAddr::from(([0u16; 8], 0))
        };
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(self.addr).await?;

        let payload = serde_json::to_vec(request)
            .map_err(|e| DeviceError::Protocol(e.to_string()))?;
        socket.send(&payload).await.map_err(|e| not_connected(self.addr, e))?;

        let mut buf = vec![0u8; MAX_DATAGRAM];
        let len = match tokio::time::timeout(self.read_timeout, socket.recv(&mut buf)).await {
            Ok(Ok(len)) => len,
            Ok(Err(e)) => return Err(not_connected(self.addr, e)),
            Err(_) => {
                return Err(DeviceError::NotConnected(format!(
                    "no response from emulator at {} within {:?}",
                    self.addr, self.read_timeout
                )))
            }
        };

        tracing::trace!(emulator = %self.addr, bytes = len, "Emulator response received");

        serde_json::from_slice(&buf[..len]).map_err(|e| DeviceError::Protocol(e.to_string()))
    }
}

fn not_connected(addr: SocketAddr, e: std::io::Error) -> DeviceError {
    match e.kind() {
        std::io::ErrorKind::ConnectionRefused => {
            DeviceError::NotConnected(format!("emulator at {} refused connection", addr))
        }
        _ => DeviceError::Transport(e),
    }
}

/// Placeholder for the USB HID transport.
#[derive(Debug, Clone, Default)]
pub struct UsbTransport;

#[async_trait]
impl Transport for UsbTransport {
    async fn exchange(&self, _request: &DeviceRequest) -> Result<DeviceResponse, DeviceError> {
        Err(DeviceError::NotConnected(
            "no USB device found".to_string(),
        ))
    }

    async fn connected(&self) -> bool {
        false
    }
}
