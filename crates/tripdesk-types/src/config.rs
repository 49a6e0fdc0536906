//! Global configuration, deserialized from `config.toml` in the data directory.

use serde::{Deserialize, Serialize};

/// Default bind host for the API server.
fn default_host() -> String {
    "127.0.0.1".to_string()
}

/// Default bind port for the API server.
fn default_port() -> u16 {
    8080
}

/// Default capacity of each room's broadcast channel.
fn default_room_buffer() -> usize {
    256
}

/// Application-wide configuration.
///
/// Every field has a default so a missing or partial `config.toml` still
/// yields a runnable configuration. CLI flags override the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Buffered events per room before slow receivers start lagging.
    #[serde(default = "default_room_buffer")]
    pub room_buffer: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            room_buffer: default_room_buffer(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.room_buffer, 256);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str("port = 9000").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.room_buffer, 256);
    }
}
