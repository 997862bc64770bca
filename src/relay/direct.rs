use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::registry::SubscriberRegistry;
use crate::utils::error::RelayError;

/// In-process delivery path.
///
/// Delivery is strictly synchronous and best-effort: the subscriber must be
/// actively draining its channel, and a payload that cannot be handed over
/// before the deadline is dropped, not queued.
#[derive(Debug)]
pub struct DirectRelay {
    registry: Arc<SubscriberRegistry>,
    delivery_timeout: Duration,
}

impl DirectRelay {
    pub fn new(registry: Arc<SubscriberRegistry>, delivery_timeout: Duration) -> Self {
        Self {
            registry,
            delivery_timeout,
        }
    }

    /// Hands `payload` to the subscriber registered under `receiver`,
    /// racing the send against the delivery deadline. No retry; the caller
    /// decides what to surface.
    pub async fn publish(&self, receiver: &str, payload: Vec<u8>) -> Result<(), RelayError> {
        let sender = self.registry.lookup(receiver).ok_or(RelayError::NotFound)?;

        match timeout(self.delivery_timeout, sender.send(payload)).await {
            Ok(Ok(())) => Ok(()),
            // The paired receiver is already gone; the registry entry just
            // has not been cleaned up yet.
            Ok(Err(_)) => Err(RelayError::NotFound),
            Err(_) => Err(RelayError::Timeout),
        }
    }
}
