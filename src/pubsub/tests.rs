use super::{InMemoryBroker, MessageBroker};

#[tokio::test]
async fn test_subscribe_after_publish_replays_history() {
    let broker = InMemoryBroker::new();
    broker.publish("chat-a", b"one").await.unwrap();
    broker.publish("chat-a", b"two").await.unwrap();

    let mut subscription = broker.subscribe("chat-a").await.unwrap();
    assert_eq!(subscription.next().await.unwrap(), b"one");
    assert_eq!(subscription.next().await.unwrap(), b"two");
}

#[tokio::test]
async fn test_each_subscription_gets_its_own_copy() {
    let broker = InMemoryBroker::new();
    let mut first = broker.subscribe("chat-a").await.unwrap();
    let mut second = broker.subscribe("chat-a").await.unwrap();

    broker.publish("chat-a", b"hello").await.unwrap();

    assert_eq!(first.next().await.unwrap(), b"hello");
    assert_eq!(second.next().await.unwrap(), b"hello");
}

#[tokio::test]
async fn test_topics_are_isolated() {
    let broker = InMemoryBroker::new();
    broker.publish("chat-a", b"for a").await.unwrap();

    let mut subscription = broker.subscribe("chat-b").await.unwrap();
    broker.publish("chat-b", b"for b").await.unwrap();

    assert_eq!(subscription.next().await.unwrap(), b"for b");
}

#[tokio::test]
async fn test_stop_is_idempotent_and_ends_the_stream() {
    let broker = InMemoryBroker::new();
    broker.publish("chat-a", b"unseen").await.unwrap();

    let mut subscription = broker.subscribe("chat-a").await.unwrap();
    subscription.stop();
    subscription.stop();

    assert!(subscription.next().await.is_none());
}

#[tokio::test]
async fn test_subscriber_count_drops_after_unsubscribe() {
    let broker = InMemoryBroker::new();
    let subscription = broker.subscribe("chat-a").await.unwrap();
    assert_eq!(broker.subscriber_count("chat-a"), 1);

    drop(subscription);
    assert_eq!(broker.subscriber_count("chat-a"), 0);
}
