//! Websocket subscribe handlers and the per-connection delivery loop.
//!
//! Both relays share the same shape: read the `{ "subscriber": ... }`
//! handshake, attach to a delivery channel, then drain it onto the socket
//! under a per-write deadline until the peer goes away. Cleanup (registry
//! removal, broker consumer teardown) runs on every exit path.

use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code};
use axum::response::Response;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::transport::http::AppState;
use crate::transport::message::SubscribeRequest;

pub async fn subscribe_direct(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_direct(socket, state))
}

pub async fn subscribe_broker(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_broker(socket, state))
}

async fn handle_direct(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();

    let Some(name) = handshake(&mut sink, &mut stream, conn_id).await else {
        return;
    };

    let mut handle = state.registry.register(&name);
    info!(%conn_id, subscriber = %name, "subscriber online");

    let write_timeout = state.settings.relay.write_timeout();
    loop {
        tokio::select! {
            delivery = handle.receiver.recv() => {
                // End-of-stream means a later registration took over the name.
                let Some(payload) = delivery else { break };
                let Ok(text) = String::from_utf8(payload) else {
                    warn!(%conn_id, subscriber = %name, "dropping non-utf8 payload");
                    continue;
                };
                if let Err(e) = write_with_timeout(&mut sink, Message::Text(text.into()), write_timeout).await {
                    warn!(%conn_id, subscriber = %name, error = %e, "write failed, closing");
                    break;
                }
            }
            frame = stream.next() => {
                if connection_closed(frame) {
                    break;
                }
            }
        }
    }

    state.registry.unregister(&name);
    info!(%conn_id, subscriber = %name, "subscriber offline");
}

async fn handle_broker(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();

    let Some(name) = handshake(&mut sink, &mut stream, conn_id).await else {
        return;
    };

    // The consumer lives exactly as long as this connection: the guard
    // cancels the token on every exit path, which stops the forwarding
    // task and releases the broker consumer.
    let cancel = CancellationToken::new();
    let _stop_consumer = cancel.clone().drop_guard();

    let mut deliveries = match state.relay.read_chat(&name, cancel.clone()).await {
        Ok(deliveries) => deliveries,
        Err(e) => {
            warn!(%conn_id, subscriber = %name, error = %e, "failed to start consumer");
            let close = CloseFrame {
                code: close_code::ERROR,
                reason: "consumer setup failed".into(),
            };
            let _ = sink.send(Message::Close(Some(close))).await;
            return;
        }
    };
    info!(%conn_id, subscriber = %name, "subscriber online");

    let write_timeout = state.settings.relay.write_timeout();
    loop {
        tokio::select! {
            delivery = deliveries.recv() => {
                let Some(message) = delivery else { break };
                let Ok(text) = serde_json::to_string(&message) else { break };
                if let Err(e) = write_with_timeout(&mut sink, Message::Text(text.into()), write_timeout).await {
                    warn!(%conn_id, subscriber = %name, error = %e, "write failed, closing");
                    break;
                }
            }
            frame = stream.next() => {
                if connection_closed(frame) {
                    break;
                }
            }
        }
    }

    info!(%conn_id, subscriber = %name, "subscriber offline");
}

/// Reads and validates the handshake frame that opens every subscribe
/// connection. Sends a close frame and returns `None` when it is missing or
/// malformed.
async fn handshake(
    sink: &mut SplitSink<WebSocket, Message>,
    stream: &mut SplitStream<WebSocket>,
    conn_id: Uuid,
) -> Option<String> {
    let close = match stream.next().await {
        Some(Ok(Message::Text(text))) => match serde_json::from_str::<SubscribeRequest>(&text) {
            Ok(request) if !request.subscriber.is_empty() => return Some(request.subscriber),
            Ok(_) => CloseFrame {
                code: close_code::INVALID,
                reason: "subscriber name must not be empty".into(),
            },
            Err(e) => {
                warn!(%conn_id, error = %e, "malformed subscribe request");
                CloseFrame {
                    code: close_code::INVALID,
                    reason: "malformed subscribe request".into(),
                }
            }
        },
        Some(Ok(_)) => CloseFrame {
            code: close_code::POLICY,
            reason: "expected a text frame".into(),
        },
        _ => CloseFrame {
            code: close_code::PROTOCOL,
            reason: "no subscribe request received".into(),
        },
    };

    let _ = sink.send(Message::Close(Some(close))).await;
    None
}

/// Inbound frames after the handshake are discarded; only close, error and
/// end-of-stream matter to the delivery loop.
fn connection_closed(frame: Option<Result<Message, axum::Error>>) -> bool {
    matches!(frame, None | Some(Err(_)) | Some(Ok(Message::Close(_))))
}

async fn write_with_timeout(
    sink: &mut SplitSink<WebSocket, Message>,
    message: Message,
    deadline: Duration,
) -> Result<(), axum::Error> {
    match timeout(deadline, sink.send(message)).await {
        Ok(result) => result,
        Err(elapsed) => Err(axum::Error::new(elapsed)),
    }
}
