use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{BrokerError, MessageBroker, Subscription};

/// Extra channel slots beyond the replayed history, for live deliveries.
const LIVE_HEADROOM: usize = 32;

#[derive(Debug, Default)]
struct TopicState {
    history: Vec<Vec<u8>>,
    live: Vec<mpsc::Sender<Vec<u8>>>,
}

/// In-process broker used by the test suite and by `server --memory-broker`.
///
/// Every published payload is retained per topic, so a subscription created
/// after a publish still replays it, matching the decoupling the external
/// broker provides. Each subscription gets its own full copy of the stream.
#[derive(Debug, Default)]
pub struct InMemoryBroker {
    topics: Mutex<HashMap<String, TopicState>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions currently attached to `topic`.
    pub fn subscriber_count(&self, topic: &str) -> usize {
        let mut topics = self.topics.lock().unwrap();
        match topics.get_mut(topic) {
            Some(state) => {
                state.live.retain(|sender| !sender.is_closed());
                state.live.len()
            }
            None => 0,
        }
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let live = {
            let mut topics = self.topics.lock().unwrap();
            let state = topics.entry(topic.to_string()).or_default();
            state.history.push(payload.to_vec());
            state.live.retain(|sender| !sender.is_closed());
            state.live.clone()
        };

        // Sends happen outside the lock. A failed send means the
        // subscription is gone; it gets pruned on the next publish.
        for sender in live {
            let _ = sender.send(payload.to_vec()).await;
        }

        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, BrokerError> {
        let mut topics = self.topics.lock().unwrap();
        let state = topics.entry(topic.to_string()).or_default();

        let (sender, receiver) = mpsc::channel(state.history.len() + LIVE_HEADROOM);
        for payload in &state.history {
            // Capacity covers the whole history, so this never fails.
            let _ = sender.try_send(payload.clone());
        }
        state.live.push(sender);

        Ok(Subscription::new(receiver, CancellationToken::new()))
    }
}
