//! Hardware wallet device access.
//!
//! # Data Flow
//! ```text
//! http gateway
//!     → Device trait (skywallet.rs handle)
//!     → Transport (transport.rs: emulator UDP / USB)
//!     → firmware
//! ```
//!
//! # Design Decisions
//! - The daemon only sees the `Device` trait; the firmware protocol and the
//!   USB HID driver live behind `Transport`
//! - `new_device` is infallible and lazy: no I/O until the first call

pub mod skywallet;
pub mod transport;
pub mod types;

use async_trait::async_trait;
use std::sync::Arc;

pub use skywallet::Skywallet;
pub use transport::{EmulatorTransport, Transport, UsbTransport};
pub use types::{DaemonMode, DeviceError, Features, SignInput, SignOutput};

/// Operations the API forwards to a hardware wallet.
#[async_trait]
pub trait Device: Send + Sync {
    /// Whether a device currently answers.
    async fn available(&self) -> bool;

    async fn features(&self) -> Result<Features, DeviceError>;

    async fn generate_addresses(
        &self,
        count: u32,
        start_index: u32,
        confirm: bool,
    ) -> Result<Vec<String>, DeviceError>;

    async fn sign_message(&self, address_index: u32, message: &str) -> Result<String, DeviceError>;

    /// Returns the address that produced `signature`.
    async fn check_message_signature(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<String, DeviceError>;

    /// Returns one signature per input.
    async fn transaction_sign(
        &self,
        inputs: Vec<SignInput>,
        outputs: Vec<SignOutput>,
    ) -> Result<Vec<String>, DeviceError>;

    async fn wipe(&self) -> Result<(), DeviceError>;

    async fn cancel(&self) -> Result<(), DeviceError>;
}

/// Create a device handle for `mode`.
pub fn new_device(mode: DaemonMode) -> Arc<dyn Device> {
    let transport: Arc<dyn Transport> = match mode {
        DaemonMode::Usb => Arc::new(UsbTransport),
        DaemonMode::Emulator => Arc::new(EmulatorTransport::default()),
    };
    tracing::debug!(mode = %mode, "Device handle created");
    Arc::new(Skywallet::new(mode, transport))
}
