//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the search server.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, connection limits).
    pub listener: ListenerConfig,

    /// Backing store settings.
    pub storage: StorageConfig,

    /// Static file serving.
    pub assets: AssetConfig,

    /// Search behavior.
    pub search: SearchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Connections handled at once. 1 means strictly serial.
    pub max_connections: usize,

    /// Upper bound on the request head (request line + headers) in bytes.
    pub max_header_bytes: usize,

    /// Per-connection read timeout in seconds (0 disables it).
    pub read_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 1,
            max_header_bytes: 8192,
            read_timeout_secs: 30,
        }
    }
}

impl ListenerConfig {
    /// Replace the port of `bind_address`, keeping the host.
    pub fn set_port(&mut self, port: u16) {
        let host = self
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        self.bind_address = format!("{host}:{port}");
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Connection string, e.g. "sqlite:epiphany.db" or "sqlite::memory:".
    pub connection_string: String,

    /// Number of demo products to seed at startup (0 disables seeding).
    pub seed_items: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            connection_string: "sqlite:epiphany.db".to_string(),
            seed_items: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory static files are served from.
    pub web_root: String,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            web_root: "epiphany/web".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Compute price aggregates for `/api/search_v2`.
    pub aggregates_enabled: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            aggregates_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Expose the metrics facade through a Prometheus endpoint.
    pub prometheus_enabled: bool,

    /// Prometheus endpoint bind address.
    pub prometheus_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            prometheus_enabled: false,
            prometheus_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.listener.max_connections, 1);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.storage, StorageConfig::default());
        assert!(config.search.aggregates_enabled);
    }

    #[test]
    fn set_port_keeps_host() {
        let mut listener = ListenerConfig::default();
        listener.set_port(3000);
        assert_eq!(listener.bind_address, "0.0.0.0:3000");

        listener.bind_address = "[::1]:80".to_string();
        listener.set_port(8081);
        assert_eq!(listener.bind_address, "[::1]:8081");
    }
}
