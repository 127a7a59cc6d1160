//! Configuration loader with layered sources.

use crate::{format_validation_errors, AppConfig, ConfigValidator};
use config::{Config, ConfigError, Environment, File};
use folio_core::FolioError;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Configuration loader with runtime refresh support.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Local overrides
    /// 4. Environment variables with `FOLIO_` prefix and `__` as the
    ///    section separator (`FOLIO_CACHE__DEFAULT_TTL_SECS=60`)
    pub fn new(config_dir: impl Into<String>) -> Result<Self, FolioError> {
        let config_dir = config_dir.into();
        let config = Self::load_config(&config_dir)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir,
        })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> Result<Self, FolioError> {
        Self::new("./config")
    }

    /// Returns the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Reloads the configuration from disk.
    ///
    /// The previous configuration stays in place if the new one fails to
    /// load or validate.
    pub async fn reload(&self) -> Result<(), FolioError> {
        let new_config = Self::load_config(&self.config_dir)?;
        let mut config = self.config.write().await;
        *config = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Loads configuration from the specified directory.
    fn load_config(config_dir: &str) -> Result<AppConfig, FolioError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var("FOLIO_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for name in ["default", environment.as_str(), "local"] {
            let path = format!("{}/{}.toml", config_dir, name);
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("FOLIO")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_error_to_folio_error)?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(config_error_to_folio_error)?;

        ConfigValidator::validate(&app_config)
            .map_err(|errors| FolioError::Configuration(format_validation_errors(&errors)))?;

        Ok(app_config)
    }

    /// Gets a specific configuration value by key path.
    pub async fn get_value<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let config = self.config.read().await;
        let json = serde_json::to_value(&*config).ok()?;

        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }

        serde_json::from_value(current.clone()).ok()
    }
}

fn config_error_to_folio_error(err: ConfigError) -> FolioError {
    FolioError::Configuration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_default(dir: &tempfile::TempDir, contents: &str) {
        fs::write(dir.path().join("default.toml"), contents).unwrap();
    }

    #[tokio::test]
    async fn test_missing_directory_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::new(dir.path().join("absent").to_string_lossy()).unwrap();
        let config = loader.get().await;
        assert_eq!(config.cache.default_ttl_secs, 300);
    }

    #[tokio::test]
    async fn test_loads_default_file() {
        let dir = tempfile::tempdir().unwrap();
        write_default(
            &dir,
            "[cache]\ndefault_ttl_secs = 42\nkey_prefix = \"folio:\"\n",
        );

        let loader = ConfigLoader::new(dir.path().to_string_lossy()).unwrap();
        let config = loader.get().await;
        assert_eq!(config.cache.default_ttl_secs, 42);
        assert_eq!(config.cache.key_prefix, "folio:");

        let ttl: Option<u64> = loader.get_value("cache.default_ttl_secs").await;
        assert_eq!(ttl, Some(42));
        let missing: Option<u64> = loader.get_value("cache.nope").await;
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_local_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        write_default(&dir, "[cache]\ndefault_ttl_secs = 42\n");
        fs::write(dir.path().join("local.toml"), "[cache]\ndefault_ttl_secs = 7\n").unwrap();

        let loader = ConfigLoader::new(dir.path().to_string_lossy()).unwrap();
        assert_eq!(loader.get().await.cache.default_ttl_secs, 7);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_default(&dir, "[redis]\nurl = \"http://localhost\"\n");

        let result = ConfigLoader::new(dir.path().to_string_lossy());
        assert!(matches!(result, Err(FolioError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_reload_picks_up_changes() {
        let dir = tempfile::tempdir().unwrap();
        write_default(&dir, "[cache]\ndefault_ttl_secs = 10\n");
        let loader = ConfigLoader::new(dir.path().to_string_lossy()).unwrap();

        write_default(&dir, "[cache]\ndefault_ttl_secs = 20\n");
        loader.reload().await.unwrap();
        assert_eq!(loader.get().await.cache.default_ttl_secs, 20);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_config() {
        let dir = tempfile::tempdir().unwrap();
        write_default(&dir, "[cache]\ndefault_ttl_secs = 10\n");
        let loader = ConfigLoader::new(dir.path().to_string_lossy()).unwrap();

        write_default(&dir, "[cache]\nmax_payload_bytes = 0\n");
        assert!(loader.reload().await.is_err());
        assert_eq!(loader.get().await.cache.default_ttl_secs, 10);
    }
}
