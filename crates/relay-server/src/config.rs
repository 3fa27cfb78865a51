//! Server configuration.
//!
//! Defaults match the historical deployment values. Text encoding is fixed
//! UTF-8 and is not configurable.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Runtime configuration, loadable from a TOML file with CLI overrides on
/// top. Every field has a default, so an empty file is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Interface to listen on.
    pub listen_address: String,
    /// Port to listen on. Port 0 binds an ephemeral port.
    pub port: u16,
    /// Maximum simultaneous connections; further peers are refused with a
    /// `500` response.
    pub max_connections: usize,
    /// Dispatch queue capacity; producers block when it is full.
    pub queue_capacity: usize,
    /// Seconds without inbound data before a connection is dropped.
    pub read_timeout_secs: u64,
    /// Maximum envelope size; one socket read must hold one envelope.
    pub max_payload_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0".to_string(),
            port: 7777,
            max_connections: 100,
            queue_capacity: 100,
            read_timeout_secs: 60,
            max_payload_len: 4096,
        }
    }
}

impl ServerConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

/// Error loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 7777);
        assert_eq!(config.max_connections, 100);
        assert_eq!(config.read_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn toml_overrides_defaults() {
        let config: ServerConfig = toml::from_str("port = 9000\nmax_connections = 5\n").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.max_payload_len, 4096);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<ServerConfig>("portt = 9000\n").is_err());
    }
}
