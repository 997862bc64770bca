use super::Settings;

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert_eq!(settings.server.host, "127.0.0.1");
    assert_eq!(settings.server.port, 8008);
    assert_eq!(settings.relay.delivery_timeout_secs, 5);
    assert_eq!(settings.relay.write_timeout_secs, 10);
    assert_eq!(settings.relay.shutdown_grace_secs, 10);
    assert_eq!(settings.broker.url, "redis://127.0.0.1:6379");
}

#[test]
fn test_timeout_accessors() {
    let settings = Settings::default();
    assert_eq!(settings.relay.delivery_timeout().as_secs(), 5);
    assert_eq!(settings.relay.write_timeout().as_secs(), 10);
}
