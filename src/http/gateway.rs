//! Gateway between API handlers and the device.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::device::{Device, DeviceError, Features, SignInput, SignOutput};

/// Forwards API calls to a device, one at a time.
///
/// `cancel` skips the queue so it can interrupt the call holding it.
pub struct Gateway {
    device: Arc<dyn Device>,
    busy: Mutex<()>,
}

impl Gateway {
    pub fn new(device: Arc<dyn Device>) -> Self {
        Self {
            device,
            busy: Mutex::new(()),
        }
    }

    pub async fn available(&self) -> bool {
        let _busy = self.busy.lock().await;
        self.device.available().await
    }

    pub async fn features(&self) -> Result<Features, DeviceError> {
        let _busy = self.busy.lock().await;
        self.device.features().await
    }

    pub async fn generate_addresses(
        &self,
        count: u32,
        start_index: u32,
        confirm: bool,
    ) -> Result<Vec<String>, DeviceError> {
        let _busy = self.busy.lock().await;
        self.device.generate_addresses(count, start_index, confirm).await
    }

    pub async fn sign_message(&self, address_index: u32, message: &str) -> Result<String, DeviceError> {
        let _busy = self.busy.lock().await;
        self.device.sign_message(address_index, message).await
    }

    pub async fn check_message_signature(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<String, DeviceError> {
        let _busy = self.busy.lock().await;
        self.device.check_message_signature(address, message, signature).await
    }

    pub async fn transaction_sign(
        &self,
        inputs: Vec<SignInput>,
        outputs: Vec<SignOutput>,
    ) -> Result<Vec<String>, DeviceError> {
        let _busy = self.busy.lock().await;
        self.device.transaction_sign(inputs, outputs).await
    }

    pub async fn wipe(&self) -> Result<(), DeviceError> {
        let _busy = self.busy.lock().await;
        self.device.wipe().await
    }

    pub async fn cancel(&self) -> Result<(), DeviceError> {
        self.device.cancel().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Holds `sign_message` open until `cancel` is called.
    #[derive(Default)]
    struct SlowDevice {
        signing: Notify,
        release: Notify,
        cancelled: AtomicBool,
    }

    #[async_trait]
    impl Device for SlowDevice {
        async fn available(&self) -> bool {
            true
        }

        async fn features(&self) -> Result<Features, DeviceError> {
            Ok(Features::default())
        }

        async fn generate_addresses(&self, _: u32, _: u32, _: bool) -> Result<Vec<String>, DeviceError> {
            Ok(Vec::new())
        }

        async fn sign_message(&self, _: u32, _: &str) -> Result<String, DeviceError> {
            self.signing.notify_one();
            self.release.notified().await;
            if self.cancelled.load(Ordering::SeqCst) {
                Err(DeviceError::Cancelled)
            } else {
                Ok("signed".to_string())
            }
        }

        async fn check_message_signature(&self, address: &str, _: &str, _: &str) -> Result<String, DeviceError> {
            Ok(address.to_string())
        }

        async fn transaction_sign(
            &self,
            _: Vec<SignInput>,
            _: Vec<SignOutput>,
        ) -> Result<Vec<String>, DeviceError> {
            Ok(Vec::new())
        }

        async fn wipe(&self) -> Result<(), DeviceError> {
            Ok(())
        }

        async fn cancel(&self) -> Result<(), DeviceError> {
            self.cancelled.store(true, Ordering::SeqCst);
            self.release.notify_one();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_calls_queue_behind_running_call() {
        let device = Arc::new(SlowDevice::default());
        let gateway = Arc::new(Gateway::new(device.clone()));

        let signing = {
            let gateway = gateway.clone();
            tokio::spawn(async move { gateway.sign_message(0, "hello").await })
        };
        device.signing.notified().await;

        let queued = tokio::time::timeout(Duration::from_millis(50), gateway.features()).await;
        assert!(queued.is_err());

        device.release.notify_one();
        assert_eq!(signing.await.unwrap().unwrap(), "signed");
        assert!(gateway.features().await.is_ok());
    }

    #[tokio::test]
    async fn test_cancel_skips_the_queue() {
        let device = Arc::new(SlowDevice::default());
        let gateway = Arc::new(Gateway::new(device.clone()));

        let signing = {
            let gateway = gateway.clone();
            tokio::spawn(async move { gateway.sign_message(0, "hello").await })
        };
        device.signing.notified().await;

        tokio::time::timeout(Duration::from_secs(1), gateway.cancel())
            .await
            .expect("cancel waited for the running call")
            .unwrap();

        let result = tokio::time::timeout(Duration::from_secs(1), signing)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(result, Err(DeviceError::Cancelled)));
        assert!(gateway.features().await.is_ok());
    }
}
