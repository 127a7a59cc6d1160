//! Server startup utilities.

use folio_config::AppConfig;
use tracing::info;

/// Prints server startup information.
pub fn print_startup_info(config: &AppConfig) {
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("REST API:  http://{}", config.server.addr());
    info!("Health:    http://{}/health", config.server.addr());
    if config.redis.enabled {
        info!("Cache:     Redis ({} connections)", config.redis.pool_size);
    } else {
        info!("Cache:     in-process memory");
    }
    info!("TTL:       {}s", config.cache.default_ttl_secs);
    info!("{}", separator);
}
