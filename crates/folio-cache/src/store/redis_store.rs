//! Redis-backed key-value store.

use super::KeyValueStore;
use async_trait::async_trait;
use deadpool_redis::{redis::AsyncCommands, Config, Pool, Runtime};
use folio_config::RedisConfig;
use folio_core::{FolioError, FolioResult};
use shaku::Component;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Keys requested per `SCAN` round-trip.
const SCAN_BATCH: usize = 500;

/// Create a Redis connection pool and check that the server answers.
pub async fn create_pool(config: &RedisConfig) -> FolioResult<Pool> {
    info!("Creating Redis connection pool for the response cache...");

    let pool = Config::from_url(&config.url)
        .builder()
        .map_err(|e| FolioError::Configuration(format!("Invalid Redis config: {}", e)))?
        .max_size(config.pool_size as usize)
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| FolioError::Configuration(format!("Failed to create Redis pool: {}", e)))?;

    let mut conn = pool
        .get()
        .await
        .map_err(|e| FolioError::Cache(format!("Failed to get Redis connection: {}", e)))?;
    deadpool_redis::redis::cmd("PING")
        .query_async::<String>(&mut *conn)
        .await
        .map_err(|e| FolioError::Cache(format!("Redis PING failed: {}", e)))?;

    info!("Redis connection pool created successfully");
    Ok(pool)
}

/// Escapes glob metacharacters so a prefix matches literally in `SCAN MATCH`.
#[must_use]
pub fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Redis-based key-value store.
#[derive(Component)]
#[shaku(interface = KeyValueStore)]
pub struct RedisStore {
    /// Redis connection pool.
    pool: Option<Arc<Pool>>,
}

impl RedisStore {
    /// Create a new Redis store.
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self { pool: Some(pool) }
    }

    /// Create a no-op store (for when Redis is disabled).
    #[must_use]
    pub fn disabled() -> Self {
        Self { pool: None }
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> FolioResult<deadpool_redis::Connection> {
        match &self.pool {
            Some(pool) => pool
                .get()
                .await
                .map_err(|e| FolioError::Cache(format!("Failed to get Redis connection: {}", e))),
            None => Err(FolioError::Cache("Cache is disabled".to_string())),
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    async fn get_raw(&self, key: &str) -> FolioResult<Option<String>> {
        if !self.is_enabled() {
            return Ok(None);
        }

        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| FolioError::Cache(format!("Failed to get key '{}': {}", key, e)))?;

        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> FolioResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut conn = self.get_conn().await?;
        // SETEX takes whole seconds and rejects zero.
        let ttl_secs = ttl.as_secs().max(1);

        conn.set_ex::<_, _, ()>(key, value, ttl_secs)
            .await
            .map_err(|e| FolioError::Cache(format!("Failed to set key '{}': {}", key, e)))?;

        debug!("Stored key '{}' with TTL {}s", key, ttl_secs);
        Ok(())
    }

    async fn delete(&self, key: &str) -> FolioResult<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }

        let mut conn = self.get_conn().await?;
        let deleted: i64 = conn
            .del(key)
            .await
            .map_err(|e| FolioError::Cache(format!("Failed to delete key '{}': {}", key, e)))?;

        Ok(deleted > 0)
    }

    async fn scan_prefix(&self, prefix: &str) -> FolioResult<Vec<String>> {
        if !self.is_enabled() {
            return Ok(Vec::new());
        }

        let mut conn = self.get_conn().await?;
        let pattern = format!("{}*", escape_glob(prefix));
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        // Cursor-based SCAN instead of KEYS so large keyspaces don't block Redis.
        loop {
            let (next, batch): (u64, Vec<String>) = deadpool_redis::redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut *conn)
                .await
                .map_err(|e| FolioError::Cache(format!("Failed to scan keys: {}", e)))?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        // SCAN may return a key more than once.
        keys.sort_unstable();
        keys.dedup();

        debug!("Found {} keys matching prefix '{}'", keys.len(), prefix);
        Ok(keys)
    }

    async fn delete_many(&self, keys: &[String]) -> FolioResult<u64> {
        if !self.is_enabled() || keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn().await?;
        let mut deleted: u64 = 0;

        for chunk in keys.chunks(SCAN_BATCH) {
            let count: u64 = conn
                .del(chunk.to_vec())
                .await
                .map_err(|e| FolioError::Cache(format!("Failed to delete keys: {}", e)))?;
            deleted += count;
        }

        debug!("Deleted {} of {} keys", deleted, keys.len());
        Ok(deleted)
    }
}
