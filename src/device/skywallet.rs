//! Device handle driving a wallet through a `Transport`.

use async_trait::async_trait;
use std::sync::Arc;

use crate::device::transport::{DeviceRequest, DeviceResponse, Transport};
use crate::device::types::{DaemonMode, DeviceError, Features, SignInput, SignOutput};
use crate::device::Device;
use crate::observability::metrics;

/// Hardware wallet handle.
///
/// Creating a handle never touches the transport; connectivity is only
/// discovered when the first request is sent.
pub struct Skywallet {
    mode: DaemonMode,
    transport: Arc<dyn Transport>,
}

impl Skywallet {
    pub fn new(mode: DaemonMode, transport: Arc<dyn Transport>) -> Self {
        Self { mode, transport }
    }

    async fn call(&self, op: &'static str, request: DeviceRequest) -> Result<DeviceResponse, DeviceError> {
        let result = self
            .transport
            .exchange(&request)
            .await
            .and_then(DeviceResponse::into_result);

        match &result {
            Ok(_) => metrics::record_device_call(op, "ok"),
            Err(e) => {
                tracing::debug!(op, mode = %self.mode, error = %e, "Device call failed");
                metrics::record_device_call(op, "error");
            }
        }
        result
    }
}

fn unexpected(op: &str, resp: DeviceResponse) -> DeviceError {
    DeviceError::Protocol(format!("unexpected response to {}: {:?}", op, resp))
}

#[async_trait]
impl Device for Skywallet {
    async fn available(&self) -> bool {
        self.transport.connected().await
    }

    async fn features(&self) -> Result<Features, DeviceError> {
        match self.call("features", DeviceRequest::GetFeatures).await? {
            DeviceResponse::Features(features) => Ok(features),
            other => Err(unexpected("features", other)),
        }
    }

    async fn generate_addresses(
        &self,
        count: u32,
        start_index: u32,
        confirm: bool,
    ) -> Result<Vec<String>, DeviceError> {
        let req = DeviceRequest::GenerateAddresses { count, start_index, confirm };
        match self.call("generate_addresses", req).await? {
            DeviceResponse::Addresses { addresses } => Ok(addresses),
            other => Err(unexpected("generate_addresses", other)),
        }
    }

    async fn sign_message(&self, address_index: u32, message: &str) -> Result<String, DeviceError> {
        let req = DeviceRequest::SignMessage {
            address_index,
            message: message.to_string(),
        };
        match self.call("sign_message", req).await? {
            DeviceResponse::Signatures { mut signatures } if signatures.len() == 1 => {
                Ok(signatures.remove(0))
            }
            other => Err(unexpected("sign_message", other)),
        }
    }

    async fn check_message_signature(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<String, DeviceError> {
        let req = DeviceRequest::CheckMessageSignature {
            address: address.to_string(),
            message: message.to_string(),
            signature: signature.to_string(),
        };
        match self.call("check_message_signature", req).await? {
            DeviceResponse::Success { message: Some(addr) } => Ok(addr),
            other => Err(unexpected("check_message_signature", other)),
        }
    }

    async fn transaction_sign(
        &self,
        inputs: Vec<SignInput>,
        outputs: Vec<SignOutput>,
    ) -> Result<Vec<String>, DeviceError> {
        let expected = inputs.len();
        match self.call("transaction_sign", DeviceRequest::TransactionSign { inputs, outputs }).await? {
            DeviceResponse::Signatures { signatures } if signatures.len() == expected => Ok(signatures),
            other => Err(unexpected("transaction_sign", other)),
        }
    }

    async fn wipe(&self) -> Result<(), DeviceError> {
        match self.call("wipe", DeviceRequest::Wipe).await? {
            DeviceResponse::Success { .. } => Ok(()),
            other => Err(unexpected("wipe", other)),
        }
    }

    async fn cancel(&self) -> Result<(), DeviceError> {
        match self.call("cancel", DeviceRequest::Cancel).await? {
            DeviceResponse::Success { .. } => Ok(()),
            other => Err(unexpected("cancel", other)),
        }
    }
}
