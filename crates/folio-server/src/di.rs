//! Dependency injection module using Shaku.
//!
//! `CacheModule` provides the key-value store behind the response cache.

use folio_cache::{create_pool, KeyValueStore, MemoryStore, RedisStore, RedisStoreParameters};
use folio_cache::{CacheSettings, ResponseCache};
use folio_config::AppConfig;
use folio_core::FolioResult;
use shaku::{module, HasComponent};
use std::sync::Arc;
use tracing::{info, warn};

// Store for the response cache, backed by Redis.
module! {
    pub CacheModule {
        components = [
            RedisStore,
        ],
        providers = [],
    }
}

/// Builds the cache module, connecting to Redis when it is enabled.
pub async fn build_cache_module(config: &AppConfig) -> FolioResult<Arc<CacheModule>> {
    let pool = if config.redis.enabled {
        Some(Arc::new(create_pool(&config.redis).await?))
    } else {
        None
    };

    let module = CacheModule::builder()
        .with_component_parameters::<RedisStore>(RedisStoreParameters { pool })
        .build();

    Ok(Arc::new(module))
}

/// Builds the response cache.
///
/// With Redis disabled the cache lives in process memory, which only suits
/// a single development instance.
pub async fn build_response_cache(config: &AppConfig) -> FolioResult<Arc<ResponseCache>> {
    let store: Arc<dyn KeyValueStore> = if config.redis.enabled {
        let module = build_cache_module(config).await?;
        module.resolve()
    } else {
        warn!("Redis is disabled, caching in process memory");
        Arc::new(MemoryStore::new())
    };

    let settings = CacheSettings::from_config(&config.cache, &config.redis);
    info!(
        "Response cache ready (default TTL {:?}, key prefix '{}')",
        settings.default_ttl, settings.key_prefix
    );

    Ok(Arc::new(ResponseCache::new(store, settings)))
}
