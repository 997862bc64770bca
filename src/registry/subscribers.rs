use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::mpsc;

/// Capacity of each subscriber's delivery channel. One slot is the closest
/// bounded analogue to a rendezvous handoff: at most one message is in
/// flight per subscriber, and further sends block until it is drained.
pub const DELIVERY_CHANNEL_CAPACITY: usize = 1;

/// Thread-safe map from subscriber name to its delivery channel.
///
/// Constructed once at startup and injected wherever it is needed; there is
/// no hidden global state, so tests can build isolated instances. The lock is
/// only ever held for map access, never across channel operations or awaits.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    subscribers: RwLock<HashMap<String, mpsc::Sender<Vec<u8>>>>,
}

/// The receiving side of a registration, owned by the subscriber's
/// connection for as long as it stays open.
#[derive(Debug)]
pub struct SubscriberHandle {
    pub name: String,
    pub receiver: mpsc::Receiver<Vec<u8>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` and returns the handle its connection drains.
    ///
    /// A second registration under the same name overwrites the first
    /// (last-writer-wins): the previous sender is dropped, so the orphaned
    /// handle observes end-of-stream instead of further deliveries.
    pub fn register(&self, name: &str) -> SubscriberHandle {
        // Channel creation stays outside the critical section.
        let (sender, receiver) = mpsc::channel(DELIVERY_CHANNEL_CAPACITY);

        let mut subscribers = self.subscribers.write().unwrap();
        subscribers.insert(name.to_string(), sender);

        SubscriberHandle {
            name: name.to_string(),
            receiver,
        }
    }

    /// Returns the delivery channel for `name`, if currently registered.
    pub fn lookup(&self, name: &str) -> Option<mpsc::Sender<Vec<u8>>> {
        self.subscribers.read().unwrap().get(name).cloned()
    }

    /// Removes the entry for `name` unconditionally.
    ///
    /// Called exactly once per successful `register`, on every exit path of
    /// the owning connection.
    pub fn unregister(&self, name: &str) {
        self.subscribers.write().unwrap().remove(name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.subscribers.read().unwrap().contains_key(name)
    }
}
