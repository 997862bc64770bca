use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::pubsub::MessageBroker;
use crate::relay::message::ChatMessage;
use crate::relay::topic::topic_for;
use crate::utils::error::RelayError;

/// Capacity of the channel between the forwarding task and the delivery
/// loop. One slot keeps at most one decoded message in flight; further
/// deliveries back up into the broker client's own flow control.
const FORWARD_CHANNEL_CAPACITY: usize = 1;

/// Broker-backed delivery path.
///
/// Publishing serializes the message onto the receiver's topic; subscribing
/// creates a broker consumer whose lifetime is tied to the websocket
/// connection through a cancellation token.
pub struct BrokerRelay {
    broker: Arc<dyn MessageBroker>,
}

impl BrokerRelay {
    pub fn new(broker: Arc<dyn MessageBroker>) -> Self {
        Self { broker }
    }

    /// Publishes `message` to its receiver's topic. Serialization and broker
    /// failures surface synchronously to the caller.
    pub async fn send_chat(&self, message: &ChatMessage) -> Result<(), RelayError> {
        let payload = serde_json::to_vec(message)?;
        self.broker
            .publish(&topic_for(&message.receiver), &payload)
            .await?;
        Ok(())
    }

    /// Starts consuming `receiver`'s topic and returns the channel the
    /// delivery loop drains.
    ///
    /// A background task deserializes each delivered payload and forwards
    /// it; a malformed payload is logged and skipped, never fatal to the
    /// stream. Cancelling `cancel` stops the task, releases the broker
    /// consumer and closes the returned channel so the delivery loop
    /// observes end-of-stream.
    pub async fn read_chat(
        &self,
        receiver: &str,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<ChatMessage>, RelayError> {
        let mut subscription = self.broker.subscribe(&topic_for(receiver)).await?;
        let (sender, deliveries) = mpsc::channel(FORWARD_CHANNEL_CAPACITY);

        let receiver = receiver.to_string();
        tokio::spawn(async move {
            info!(receiver = %receiver, "started consuming");

            loop {
                let payload = tokio::select! {
                    _ = cancel.cancelled() => break,
                    payload = subscription.next() => payload,
                };
                let Some(payload) = payload else { break };

                let message = match serde_json::from_slice::<ChatMessage>(&payload) {
                    Ok(message) => message,
                    Err(e) => {
                        warn!(receiver = %receiver, error = %e, "skipping malformed chat payload");
                        continue;
                    }
                };

                let delivered = tokio::select! {
                    _ = cancel.cancelled() => false,
                    sent = sender.send(message) => sent.is_ok(),
                };
                if !delivered {
                    break;
                }
            }

            subscription.stop();
            info!(receiver = %receiver, "stopped consuming");
        });

        Ok(deliveries)
    }
}
