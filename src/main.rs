//! CLI for chatrelay
//!
//! Subcommands:
//! - `server`: run the HTTP/websocket relay
//! - `client`: subscribe under a name and print every delivered message
//!   (useful for smoke tests)

use std::sync::Arc;

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use chatrelay::config::load_config;
use chatrelay::pubsub::{InMemoryBroker, MessageBroker, RedisStreamBroker};
use chatrelay::transport::http::{AppState, router};

#[derive(Parser)]
#[command(name = "chatrelay")]
enum Command {
    /// Start the relay server
    Server {
        /// Use the in-memory broker instead of redis (single-process only)
        #[arg(long)]
        memory_broker: bool,
    },
    /// Subscribe to the direct relay and print incoming messages
    Client {
        /// Websocket URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:8008/subscribe")]
        url: String,
        /// Name to register under
        #[arg(long)]
        subscriber: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    chatrelay::utils::logging::init("info");

    match Command::parse() {
        Command::Server { memory_broker } => {
            if let Err(e) = run_server(memory_broker).await {
                error!("server failed: {e}");
            }
        }
        Command::Client { url, subscriber } => {
            if let Err(e) = run_client(&url, &subscriber).await {
                error!("client failed: {e}");
            }
        }
    }
}

async fn run_server(memory_broker: bool) -> Result<(), Box<dyn std::error::Error>> {
    let settings = load_config()?;

    let broker: Arc<dyn MessageBroker> = if memory_broker {
        info!("using in-memory broker");
        Arc::new(InMemoryBroker::new())
    } else {
        Arc::new(RedisStreamBroker::connect(&settings.broker.url).await?)
    };

    let state = AppState::new(broker, settings.clone());
    let app = router(state);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("application started at {addr}");

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            info!("shutdown signal received, draining connections");
            shutdown.cancel();
        });
    }

    // In-flight requests get the grace period to drain, then we stop waiting.
    let grace = settings.relay.shutdown_grace();
    let grace_elapsed = shutdown.clone();
    tokio::select! {
        result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.clone().cancelled_owned()) => result?,
        _ = async {
            grace_elapsed.cancelled().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!("shutdown grace period elapsed, exiting");
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install sigterm handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

async fn run_client(url: &str, subscriber: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (mut ws, _response) = connect_async(url).await?;

    let handshake = serde_json::json!({ "subscriber": subscriber }).to_string();
    ws.send(WsMessage::Text(handshake.into())).await?;
    info!("subscribed as {subscriber}, waiting for messages (ctrl-c to exit)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            frame = ws.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => println!("{text}"),
                Some(Ok(WsMessage::Close(_))) | None => {
                    warn!("server closed the connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("read failed: {e}");
                    break;
                }
            },
        }
    }

    ws.close(None).await.ok();
    Ok(())
}
