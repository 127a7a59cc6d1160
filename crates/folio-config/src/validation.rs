//! Configuration validation module.
//!
//! Checks every value once at load time so that a bad Redis URL or log
//! level fails startup instead of surfacing as a stream of degraded cache
//! operations.

use crate::AppConfig;
use std::fmt;
use url::Url;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    /// Port number is invalid (must be 1-65535).
    InvalidPort { name: String, value: u16 },
    /// Pool size is outside the accepted range.
    PoolSizeOutOfRange { value: u32, minimum: u32, maximum: u32 },
    /// URL format is invalid.
    InvalidUrl { url_type: String, message: String },
    /// Timeout value must be positive.
    NonPositiveTimeout { name: String, value: u64 },
    /// Size limit must be positive.
    NonPositiveLimit { name: String },
    /// Log level is invalid.
    InvalidLogLevel { value: String },
    /// Log format is invalid.
    InvalidLogFormat { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPort { name, value } => {
                write!(f, "Invalid port for {}: {} (must be 1-65535)", name, value)
            }
            Self::PoolSizeOutOfRange { value, minimum, maximum } => {
                write!(
                    f,
                    "Pool size {} out of range (must be between {} and {})",
                    value, minimum, maximum
                )
            }
            Self::InvalidUrl { url_type, message } => {
                write!(f, "Invalid {} URL: {}", url_type, message)
            }
            Self::NonPositiveTimeout { name, value } => {
                write!(f, "Timeout '{}' must be positive, got {}", name, value)
            }
            Self::NonPositiveLimit { name } => {
                write!(f, "Limit '{}' must be positive", name)
            }
            Self::InvalidLogLevel { value } => {
                write!(
                    f,
                    "Invalid log level: '{}' (valid: trace, debug, info, warn, error)",
                    value
                )
            }
            Self::InvalidLogFormat { value } => {
                write!(f, "Invalid log format: '{}' (valid: pretty, json)", value)
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Minimum connection pool size.
    const MIN_POOL_SIZE: u32 = 1;
    /// Maximum connection pool size.
    const MAX_POOL_SIZE: u32 = 512;
    /// Accepted Redis URL schemes.
    const REDIS_SCHEMES: &'static [&'static str] = &["redis", "rediss", "unix", "redis+unix"];
    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];
    /// Valid log formats.
    const VALID_LOG_FORMATS: &'static [&'static str] = &["pretty", "json"];

    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        Self::validate_server(&config.server, &mut errors);
        Self::validate_redis(&config.redis, &mut errors);
        Self::validate_cache(&config.cache, &mut errors);
        Self::validate_observability(&config.observability, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn validate_server(config: &crate::ServerConfig, errors: &mut Vec<ConfigValidationError>) {
        if config.port == 0 {
            errors.push(ConfigValidationError::InvalidPort {
                name: "server.port".to_string(),
                value: config.port,
            });
        }
    }

    fn validate_redis(config: &crate::RedisConfig, errors: &mut Vec<ConfigValidationError>) {
        if !config.enabled {
            return;
        }

        match Url::parse(&config.url) {
            Ok(url) if Self::REDIS_SCHEMES.contains(&url.scheme()) => {}
            Ok(url) => errors.push(ConfigValidationError::InvalidUrl {
                url_type: "redis".to_string(),
                message: format!("unsupported scheme '{}'", url.scheme()),
            }),
            Err(e) => errors.push(ConfigValidationError::InvalidUrl {
                url_type: "redis".to_string(),
                message: e.to_string(),
            }),
        }

        if !(Self::MIN_POOL_SIZE..=Self::MAX_POOL_SIZE).contains(&config.pool_size) {
            errors.push(ConfigValidationError::PoolSizeOutOfRange {
                value: config.pool_size,
                minimum: Self::MIN_POOL_SIZE,
                maximum: Self::MAX_POOL_SIZE,
            });
        }

        if config.operation_timeout_ms == 0 {
            errors.push(ConfigValidationError::NonPositiveTimeout {
                name: "redis.operation_timeout_ms".to_string(),
                value: 0,
            });
        }
    }

    fn validate_cache(config: &crate::CacheConfig, errors: &mut Vec<ConfigValidationError>) {
        // default_ttl_secs = 0 is allowed: it turns writes into no-ops.
        if config.max_payload_bytes == 0 {
            errors.push(ConfigValidationError::NonPositiveLimit {
                name: "cache.max_payload_bytes".to_string(),
            });
        }
    }

    fn validate_observability(
        config: &crate::ObservabilityConfig,
        errors: &mut Vec<ConfigValidationError>,
    ) {
        let level = config.log_level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(ConfigValidationError::InvalidLogLevel {
                value: config.log_level.clone(),
            });
        }

        let format = config.log_format.to_lowercase();
        if !Self::VALID_LOG_FORMATS.contains(&format.as_str()) {
            errors.push(ConfigValidationError::InvalidLogFormat {
                value: config.log_format.clone(),
            });
        }
    }
}

/// Formats validation errors for display.
pub fn format_validation_errors(errors: &[ConfigValidationError]) -> String {
    let mut output = String::from("Configuration validation failed:\n");
    for (i, error) in errors.iter().enumerate() {
        output.push_str(&format!("  {}. {}\n", i + 1, error));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes() {
        assert!(ConfigValidator::validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_invalid_redis_scheme() {
        let mut config = AppConfig::default();
        config.redis.url = "http://localhost:6379".to_string();

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors.iter().any(|e| matches!(
            e,
            ConfigValidationError::InvalidUrl { url_type, .. } if url_type == "redis"
        )));
    }

    #[test]
    fn test_unparseable_redis_url() {
        let mut config = AppConfig::default();
        config.redis.url = "not a url".to_string();

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_redis_checks_skipped_when_disabled() {
        let mut config = AppConfig::default();
        config.redis.enabled = false;
        config.redis.url = "not a url".to_string();
        config.redis.pool_size = 0;

        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_pool_size_out_of_range() {
        let mut config = AppConfig::default();
        config.redis.pool_size = 0;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigValidationError::PoolSizeOutOfRange { value: 0, .. })));
    }

    #[test]
    fn test_zero_operation_timeout() {
        let mut config = AppConfig::default();
        config.redis.operation_timeout_ms = 0;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigValidationError::NonPositiveTimeout { .. })));
    }

    #[test]
    fn test_zero_ttl_is_allowed() {
        let mut config = AppConfig::default();
        config.cache.default_ttl_secs = 0;
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_zero_payload_limit() {
        let mut config = AppConfig::default();
        config.cache.max_payload_bytes = 0;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ConfigValidationError::NonPositiveLimit {
                name: "cache.max_payload_bytes".to_string()
            }]
        );
    }

    #[test]
    fn test_invalid_log_settings() {
        let mut config = AppConfig::default();
        config.observability.log_level = "loud".to_string();
        config.observability.log_format = "xml".to_string();
        config.server.port = 0;

        let errors = ConfigValidator::validate(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_format_validation_errors() {
        let errors = vec![
            ConfigValidationError::InvalidLogLevel {
                value: "loud".to_string(),
            },
            ConfigValidationError::InvalidPort {
                name: "server.port".to_string(),
                value: 0,
            },
        ];

        let output = format_validation_errors(&errors);
        assert!(output.contains("1. Invalid log level"));
        assert!(output.contains("2. Invalid port"));
    }
}
