use serde::{Deserialize, Serialize};

use crate::relay::ChatMessage;

/// Body of a publish request on `/publish` and `/v2/publish`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
    pub sender: String,
    pub receiver: String,
    pub message: String,
}

/// First text frame a subscriber sends after the websocket upgrade.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub subscriber: String,
}

impl From<PublishRequest> for ChatMessage {
    fn from(request: PublishRequest) -> Self {
        Self {
            sender: request.sender,
            receiver: request.receiver,
            message: request.message,
        }
    }
}
