use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::config::Settings;
use crate::pubsub::InMemoryBroker;
use crate::relay::ChatMessage;
use crate::transport::http::{AppState, router};

async fn spawn_server() -> SocketAddr {
    let mut settings = Settings::default();
    settings.relay.delivery_timeout_secs = 1;

    let state = AppState::new(Arc::new(InMemoryBroker::new()), settings);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });

    addr
}

async fn subscribe(
    addr: SocketAddr,
    path: &str,
    name: &str,
) -> WebSocketStream<MaybeTlsStream<TcpStream>> {
    let (mut ws, _) = connect_async(format!("ws://{addr}{path}"))
        .await
        .expect("websocket connect");
    ws.send(WsMessage::Text(
        json!({ "subscriber": name }).to_string().into(),
    ))
    .await
    .expect("send handshake");

    // Give the server a moment to process the handshake and register
    tokio::time::sleep(Duration::from_millis(200)).await;
    ws
}

#[tokio::test]
async fn test_welcome_page() {
    let addr = spawn_server().await;

    let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert!(response.status().is_success());
    assert!(response.text().await.unwrap().contains("Welcome"));
}

#[tokio::test]
async fn test_direct_publish_reaches_live_subscriber() {
    let addr = spawn_server().await;
    let mut ws = subscribe(addr, "/subscribe", "alice").await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/publish"))
        .json(&json!({ "sender": "bob", "receiver": "alice", "message": "hi alice" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    match ws.next().await {
        Some(Ok(WsMessage::Text(text))) => assert_eq!(text.as_str(), "hi alice"),
        other => panic!("expected text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn test_direct_publish_without_subscriber_is_not_found() {
    let addr = spawn_server().await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/publish"))
        .json(&json!({ "sender": "bob", "receiver": "ghost", "message": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn test_malformed_publish_body_is_client_error() {
    let addr = spawn_server().await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/publish"))
        .header("content-type", "application/json")
        .body("this is not json")
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_empty_receiver_is_rejected() {
    let addr = spawn_server().await;

    let response = reqwest::Client::new()
        .post(format!("http://{addr}/v2/publish"))
        .json(&json!({ "sender": "bob", "receiver": "", "message": "hi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_broker_publish_then_subscribe_delivers() {
    let addr = spawn_server().await;

    // Publish before anyone subscribes; the broker path must still deliver.
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/v2/publish"))
        .json(&json!({ "sender": "a", "receiver": "carol", "message": "hello carol" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let mut ws = subscribe(addr, "/v2/subscribe", "carol").await;
    match ws.next().await {
        Some(Ok(WsMessage::Text(text))) => {
            let message: ChatMessage = serde_json::from_str(text.as_str()).unwrap();
            assert_eq!(message.sender, "a");
            assert_eq!(message.receiver, "carol");
            assert_eq!(message.message, "hello carol");
        }
        other => panic!("expected text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_text_handshake_closes_the_connection() {
    let addr = spawn_server().await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/subscribe"))
        .await
        .unwrap();
    ws.send(WsMessage::Binary(b"oops".to_vec().into()))
        .await
        .unwrap();

    match ws.next().await {
        Some(Ok(WsMessage::Close(_))) | None => {}
        other => panic!("expected close, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_handshake_closes_the_connection() {
    let addr = spawn_server().await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/v2/subscribe"))
        .await
        .unwrap();
    ws.send(WsMessage::Text("this is not json".into()))
        .await
        .unwrap();

    match ws.next().await {
        Some(Ok(WsMessage::Close(_))) | None => {}
        other => panic!("expected close, got {other:?}"),
    }
}
