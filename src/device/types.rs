//! Device-facing types and error definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which kind of device the daemon drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DaemonMode {
    /// Physical device attached over USB.
    #[default]
    #[serde(rename = "USB")]
    Usb,
    /// Firmware emulator reachable over UDP.
    #[serde(rename = "EMULATOR")]
    Emulator,
}

impl fmt::Display for DaemonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaemonMode::Usb => f.write_str("USB"),
            DaemonMode::Emulator => f.write_str("EMULATOR"),
        }
    }
}

impl FromStr for DaemonMode {
    type Err = DeviceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USB" => Ok(DaemonMode::Usb),
            "EMULATOR" => Ok(DaemonMode::Emulator),
            other => Err(DeviceError::InvalidArgument(format!(
                "unknown daemon mode \"{}\" (expected USB or EMULATOR)",
                other
            ))),
        }
    }
}

/// Errors reported by a device or its transport.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No device answered on the transport.
    #[error("device not connected: {0}")]
    NotConnected(String),

    /// The user rejected or cancelled the operation on the device.
    #[error("operation cancelled on device")]
    Cancelled,

    /// The request was malformed for the device.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The device answered with a failure.
    #[error("device failure: {0}")]
    Failure(String),

    /// Transport-level I/O failure.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// Response could not be decoded.
    #[error("malformed device response: {0}")]
    Protocol(String),
}

/// Device capabilities and state as reported by the firmware.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Features {
    pub vendor: String,
    pub device_id: String,
    pub firmware_version: String,
    pub label: Option<String>,
    pub initialized: bool,
    pub pin_protection: bool,
    pub passphrase_protection: bool,
    pub needs_backup: bool,
}

/// A transaction input handed to the device for signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInput {
    pub hash: String,
    pub index: u32,
}

/// A transaction output handed to the device for signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOutput {
    pub address: String,
    pub coins: u64,
    pub hours: u64,
    pub address_index: Option<u32>,
}
