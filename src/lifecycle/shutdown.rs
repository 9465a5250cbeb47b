//! Shutdown coordination for the daemon.

use tokio_util::sync::CancellationToken;

/// One-shot quit notification.
///
/// Cloning yields a handle to the same notification. Triggering is
/// idempotent and observed by every clone, including ones that start
/// waiting after the trigger.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Create a new, untriggered notification.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once the notification has fired.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }

    /// A notification that fires with this one but can also be triggered
    /// on its own.
    pub fn child(&self) -> Shutdown {
        Shutdown {
            token: self.token.child_token(),
        }
    }
}
