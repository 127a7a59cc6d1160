//! Application configuration structures.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Redis configuration.
    #[serde(default)]
    pub redis: RedisConfig,

    /// Response cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "folio".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Returns the bind address.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Redis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis URL.
    pub url: String,
    /// Connection pool size.
    pub pool_size: u32,
    /// Enable Redis (can be disabled for local development).
    pub enabled: bool,
    /// Upper bound for a single store round-trip, in milliseconds.
    pub operation_timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379/0".to_string(),
            pool_size: 10,
            enabled: true,
            operation_timeout_ms: 500,
        }
    }
}

impl RedisConfig {
    /// Returns the per-operation timeout as a Duration.
    #[must_use]
    pub const fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Default entry lifetime in seconds. Zero disables writes.
    pub default_ttl_secs: u64,
    /// Namespace prepended to every key. Empty disables namespacing, and
    /// then a full clear removes keys other applications wrote.
    pub key_prefix: String,
    /// Largest encoded payload accepted for storage.
    pub max_payload_bytes: usize,
    /// Remove entries whose payload fails to parse instead of waiting for expiry.
    pub delete_on_corruption: bool,
    /// Cache under keys whose identity placeholders could not be filled.
    pub cache_anonymous: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 300, // 5 minutes
            key_prefix: "folio:".to_string(),
            max_payload_bytes: 512 * 1024,
            delete_on_corruption: false,
            cache_anonymous: false,
        }
    }
}

impl CacheConfig {
    /// Returns the default TTL as a Duration.
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json, pretty).
    pub log_format: String,
    /// Enable metrics.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.cache.default_ttl_secs, 300);
        assert_eq!(config.cache.default_ttl(), Duration::from_secs(300));
        assert_eq!(config.cache.key_prefix, "folio:");
        assert!(!config.cache.cache_anonymous);
        assert!(config.redis.enabled);
        assert_eq!(config.redis.operation_timeout(), Duration::from_millis(500));
        assert_eq!(config.server.addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"cache": {"default_ttl_secs": 60}}"#).unwrap();
        assert_eq!(config.cache.default_ttl_secs, 60);
        assert_eq!(config.cache.max_payload_bytes, 512 * 1024);
        assert_eq!(config.redis.pool_size, 10);
    }
}
