use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use crate::config::Settings;
use crate::pubsub::MessageBroker;
use crate::registry::SubscriberRegistry;
use crate::relay::{BrokerRelay, ChatMessage, DirectRelay};
use crate::transport::message::PublishRequest;
use crate::transport::websocket;
use crate::utils::error::RelayError;

/// Shared state injected into every handler.
///
/// Built once at startup; the registry is the only mutable structure shared
/// across connections.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SubscriberRegistry>,
    pub direct: Arc<DirectRelay>,
    pub relay: Arc<BrokerRelay>,
    pub settings: Settings,
}

impl AppState {
    pub fn new(broker: Arc<dyn MessageBroker>, settings: Settings) -> Self {
        let registry = Arc::new(SubscriberRegistry::new());
        let direct = Arc::new(DirectRelay::new(
            registry.clone(),
            settings.relay.delivery_timeout(),
        ));
        let relay = Arc::new(BrokerRelay::new(broker));

        Self {
            registry,
            direct,
            relay,
            settings,
        }
    }
}

/// Builds the full HTTP surface: the direct relay under `/publish` and
/// `/subscribe`, the broker relay under `/v2/`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/publish", post(publish_direct))
        .route("/subscribe", get(websocket::subscribe_direct))
        .route("/v2/publish", post(publish_broker))
        .route("/v2/subscribe", get(websocket::subscribe_broker))
        .with_state(state)
}

async fn welcome() -> Html<&'static str> {
    Html("Welcome to chatrelay!")
}

/// Direct relay publish: hands the message text to the receiver's live
/// registration. Echoes the request body on success.
async fn publish_direct(
    State(state): State<AppState>,
    Json(request): Json<PublishRequest>,
) -> Result<Json<PublishRequest>, RelayError> {
    validate(&request)?;
    info!(sender = %request.sender, receiver = %request.receiver, "received publish request");

    state
        .direct
        .publish(&request.receiver, request.message.clone().into_bytes())
        .await?;

    Ok(Json(request))
}

/// Broker relay publish: serializes the whole message onto the receiver's
/// topic. Echoes the request body on success.
async fn publish_broker(
    State(state): State<AppState>,
    Json(request): Json<PublishRequest>,
) -> Result<Json<PublishRequest>, RelayError> {
    validate(&request)?;
    info!(sender = %request.sender, receiver = %request.receiver, "received publish request");

    state
        .relay
        .send_chat(&ChatMessage::from(request.clone()))
        .await?;

    Ok(Json(request))
}

fn validate(request: &PublishRequest) -> Result<(), RelayError> {
    if request.receiver.is_empty() {
        return Err(RelayError::BadRequest(
            "receiver must not be empty".to_string(),
        ));
    }
    Ok(())
}
