use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::{ConnectionManager, MultiplexedConnection};
use redis::streams::{StreamMaxlen, StreamReadOptions, StreamReadReply};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{BrokerError, MessageBroker, Subscription};

/// Field under which the payload is stored in each stream entry.
const PAYLOAD_FIELD: &str = "payload";
/// Approximate upper bound on retained entries per topic stream.
const MAX_STREAM_LENGTH: usize = 10_000;
/// How long a single XREAD blocks waiting for new entries, in milliseconds.
const XREAD_BLOCK_MS: usize = 1_000;
/// Max entries fetched per XREAD.
const XREAD_BATCH_SIZE: usize = 64;
/// Capacity of the per-subscription forwarding channel.
const SUBSCRIPTION_CHANNEL_CAPACITY: usize = 64;
/// Delay before retrying after a failed read.
const READ_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Broker backed by redis streams.
///
/// Publishing appends to the topic's stream with XADD; each subscription
/// reads the stream with its own cursor starting at `0-0`, so every
/// subscriber gets the full retained history followed by live entries.
/// Concurrent subscribers for the same topic therefore each receive an
/// independent copy rather than load-balancing one.
pub struct RedisStreamBroker {
    client: redis::Client,
    publish_conn: ConnectionManager,
}

impl RedisStreamBroker {
    pub async fn connect(url: &str) -> Result<Self, BrokerError> {
        let client = redis::Client::open(url)?;
        let publish_conn = ConnectionManager::new(client.clone()).await?;
        Ok(Self {
            client,
            publish_conn,
        })
    }
}

#[async_trait]
impl MessageBroker for RedisStreamBroker {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let mut conn = self.publish_conn.clone();
        conn.xadd_maxlen::<_, _, _, _, String>(
            topic,
            StreamMaxlen::Approx(MAX_STREAM_LENGTH),
            "*",
            &[(PAYLOAD_FIELD, payload)],
        )
        .await?;
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, BrokerError> {
        // A blocking XREAD would stall every other command multiplexed on a
        // shared connection, so each subscription reads on its own.
        let conn = self.client.get_multiplexed_async_connection().await?;

        let (sender, receiver) = mpsc::channel(SUBSCRIPTION_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        tokio::spawn(read_stream(
            self.client.clone(),
            conn,
            topic.to_string(),
            sender,
            cancel.clone(),
        ));

        Ok(Subscription::new(receiver, cancel))
    }
}

/// Pulls entries from `topic` and forwards their payloads until cancelled.
///
/// The cursor survives reconnects, so entries are not replayed after a
/// dropped connection.
async fn read_stream(
    client: redis::Client,
    mut conn: MultiplexedConnection,
    topic: String,
    sender: mpsc::Sender<Vec<u8>>,
    cancel: CancellationToken,
) {
    info!(topic = %topic, "stream consumer started");

    // "0-0" delivers the full retained history before live entries.
    let mut cursor = "0-0".to_string();

    'read: loop {
        let options = StreamReadOptions::default()
            .block(XREAD_BLOCK_MS)
            .count(XREAD_BATCH_SIZE);

        let keys = [topic.as_str()];
        let ids = [cursor.as_str()];
        let reply = tokio::select! {
            _ = cancel.cancelled() => break 'read,
            reply = conn.xread_options::<_, _, Option<StreamReadReply>>(
                &keys,
                &ids,
                &options,
            ) => reply,
        };

        match reply {
            Ok(Some(reply)) => {
                for key in reply.keys {
                    for entry in key.ids {
                        cursor = entry.id.clone();

                        let payload = entry
                            .map
                            .get(PAYLOAD_FIELD)
                            .and_then(|value| redis::from_redis_value::<Vec<u8>>(value.clone()).ok());
                        let Some(payload) = payload else {
                            warn!(topic = %topic, id = %entry.id, "stream entry without payload field, skipping");
                            continue;
                        };

                        let delivered = tokio::select! {
                            _ = cancel.cancelled() => false,
                            sent = sender.send(payload) => sent.is_ok(),
                        };
                        if !delivered {
                            break 'read;
                        }
                    }
                }
            }
            // The blocked read timed out with no new entries.
            Ok(None) => {}
            Err(e) => {
                warn!(topic = %topic, error = %e, "stream read failed, reconnecting");
                tokio::select! {
                    _ = cancel.cancelled() => break 'read,
                    _ = tokio::time::sleep(READ_RETRY_DELAY) => {}
                }
                match client.get_multiplexed_async_connection().await {
                    Ok(fresh) => conn = fresh,
                    Err(e) => warn!(topic = %topic, error = %e, "redis reconnect failed"),
                }
            }
        }
    }

    info!(topic = %topic, "stream consumer stopped");
}
