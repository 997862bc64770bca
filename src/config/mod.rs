mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{BrokerSettings, RelaySettings, ServerSettings, Settings};

#[cfg(test)]
mod tests;

/// Loads the configuration from the default file and environment variables
/// Merges the configuration with default values
/// Returns a `Settings` struct containing the server, relay and broker configurations
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(Environment::default().separator("__"));

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();

    Ok(Settings {
        server: ServerSettings {
            host: partial
                .server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: partial
                .server
                .as_ref()
                .and_then(|s| s.port)
                .unwrap_or(default.server.port),
        },
        relay: RelaySettings {
            delivery_timeout_secs: partial
                .relay
                .as_ref()
                .and_then(|r| r.delivery_timeout_secs)
                .unwrap_or(default.relay.delivery_timeout_secs),
            write_timeout_secs: partial
                .relay
                .as_ref()
                .and_then(|r| r.write_timeout_secs)
                .unwrap_or(default.relay.write_timeout_secs),
            shutdown_grace_secs: partial
                .relay
                .as_ref()
                .and_then(|r| r.shutdown_grace_secs)
                .unwrap_or(default.relay.shutdown_grace_secs),
        },
        broker: BrokerSettings {
            url: partial
                .broker
                .as_ref()
                .and_then(|b| b.url.clone())
                .unwrap_or(default.broker.url),
        },
    })
}
