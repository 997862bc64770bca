use serde::{Deserialize, Serialize};

/// A chat message in transit between a sender and a named receiver.
///
/// Constructed at the publish boundary and immutable from then on. The JSON
/// form (`sender`/`receiver`/`message`) is both the broker wire format and
/// what broker-relay subscribers receive on their websocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: String,
    pub receiver: String,
    pub message: String,
}
