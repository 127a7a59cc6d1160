//! Key-value store contract.
//!
//! The facade only ever talks to a [`KeyValueStore`]. Redis backs it in
//! production; [`MemoryStore`] stands in for tests and for development
//! without Redis.

mod memory_store;
mod redis_store;

pub use memory_store::MemoryStore;
pub use redis_store::{create_pool, escape_glob, RedisStore, RedisStoreParameters};

use async_trait::async_trait;
use folio_core::FolioResult;
use shaku::Interface;
use std::time::Duration;

/// Remote key-value store holding encoded cache entries.
///
/// Payloads are opaque UTF-8 strings. The store owns expiry; callers never
/// enumerate entries except through [`scan_prefix`](Self::scan_prefix).
#[async_trait]
pub trait KeyValueStore: Interface + Send + Sync {
    /// Get a raw payload.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    async fn get_raw(&self, key: &str) -> FolioResult<Option<String>>;

    /// Set a raw payload with a TTL.
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> FolioResult<()>;

    /// Delete a key.
    ///
    /// Returns `true` if the key existed and was deleted.
    async fn delete(&self, key: &str) -> FolioResult<bool>;

    /// List every live key starting with `prefix`, matched literally.
    ///
    /// Not a snapshot: keys written concurrently may or may not appear.
    async fn scan_prefix(&self, prefix: &str) -> FolioResult<Vec<String>>;

    /// Delete several keys, returning how many existed.
    async fn delete_many(&self, keys: &[String]) -> FolioResult<u64>;

    /// Check if the store is enabled.
    fn is_enabled(&self) -> bool;
}
