//! The `pubsub` module is the seam to the external message broker.
//!
//! The relay core only needs two capabilities from a broker: publish a
//! payload to a named topic, and subscribe to a topic as a cancellable
//! stream of payloads. `MessageBroker` captures exactly that, with a
//! redis-streams implementation for production and an in-memory one for
//! tests and broker-less local runs.

pub mod memory;
pub mod redis_stream;

pub use memory::InMemoryBroker;
pub use redis_stream::RedisStreamBroker;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Producer and consumer capabilities of the external broker.
#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Publishes one payload to `topic`. Fails synchronously when the broker
    /// is unreachable; there is no local buffering or retry.
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), BrokerError>;

    /// Opens an independent stream of payload deliveries for `topic`.
    async fn subscribe(&self, topic: &str) -> Result<Subscription, BrokerError>;
}

/// A live consumer bound to one topic.
///
/// Dropping the subscription stops the consumer; `stop` is idempotent and
/// safe to call while the stream is active.
pub struct Subscription {
    receiver: mpsc::Receiver<Vec<u8>>,
    cancel: CancellationToken,
}

impl Subscription {
    pub(crate) fn new(receiver: mpsc::Receiver<Vec<u8>>, cancel: CancellationToken) -> Self {
        Self { receiver, cancel }
    }

    /// Next payload, or `None` once the subscription is stopped or the
    /// broker side of the stream ends.
    pub async fn next(&mut self) -> Option<Vec<u8>> {
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            payload = self.receiver.recv() => payload,
        }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests;
