use super::SubscriberRegistry;

#[tokio::test]
async fn test_register_then_lookup_delivers_payload() {
    let registry = SubscriberRegistry::new();
    let mut handle = registry.register("alice");

    let sender = registry.lookup("alice").expect("alice should be registered");
    sender.send(b"hello".to_vec()).await.unwrap();

    assert_eq!(handle.receiver.recv().await.unwrap(), b"hello");
}

#[test]
fn test_lookup_unknown_name() {
    let registry = SubscriberRegistry::new();
    assert!(registry.lookup("nobody").is_none());
}

#[test]
fn test_unregister_removes_entry() {
    let registry = SubscriberRegistry::new();
    let _handle = registry.register("alice");
    assert!(registry.contains("alice"));

    registry.unregister("alice");
    assert!(!registry.contains("alice"));
    assert!(registry.lookup("alice").is_none());
}

#[tokio::test]
async fn test_second_registration_wins() {
    let registry = SubscriberRegistry::new();
    let mut first = registry.register("alice");
    let mut second = registry.register("alice");

    let sender = registry.lookup("alice").unwrap();
    sender.send(b"hi".to_vec()).await.unwrap();

    // Only the later registration's channel receives deliveries.
    assert_eq!(second.receiver.recv().await.unwrap(), b"hi");
    // The overwrite dropped the first sender, so the orphaned handle sees
    // end-of-stream rather than hanging.
    assert!(first.receiver.recv().await.is_none());
}
