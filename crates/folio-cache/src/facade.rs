//! Best-effort cache facade.
//!
//! [`ResponseCache`] runs every operation through the codec and a
//! [`KeyValueStore`]. It never returns an error: store outages, corrupt
//! payloads and unstorable values come back as explicit degraded outcomes,
//! so a caching failure can never fail the caller's request.

use crate::codec::{self, CacheValue};
use crate::keys;
use crate::memoize::Memoizer;
use crate::metrics::{record_degraded, record_hit, record_invalidated, record_miss, record_write};
use crate::store::KeyValueStore;
use crate::template::KeyTemplate;
use folio_config::{CacheConfig, RedisConfig};
use folio_core::{FolioError, FolioResult};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why a cache operation did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DegradedReason {
    /// The store failed or did not answer in time.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The stored payload is not valid wire text.
    #[error("corrupt payload: {0}")]
    CorruptPayload(String),

    /// The encoded payload exceeds the configured limit.
    #[error("payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    /// A zero TTL was requested; nothing was written.
    #[error("zero TTL, entry not stored")]
    ZeroTtl,

    /// Caching is turned off.
    #[error("cache disabled")]
    Disabled,
}

impl DegradedReason {
    /// Short label used as a metrics dimension.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::CorruptPayload(_) => "corrupt_payload",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::ZeroTtl => "zero_ttl",
            Self::Disabled => "disabled",
        }
    }
}

/// Outcome of [`ResponseCache::get`].
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(CacheValue),
    Miss,
    Degraded(DegradedReason),
}

impl CacheLookup {
    /// The cached value, treating a degraded lookup as a miss.
    #[must_use]
    pub fn into_value(self) -> Option<CacheValue> {
        match self {
            Self::Hit(value) => Some(value),
            Self::Miss | Self::Degraded(_) => None,
        }
    }

    #[must_use]
    pub const fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }
}

/// Outcome of [`ResponseCache::set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheWrite {
    Stored,
    Degraded(DegradedReason),
}

impl CacheWrite {
    #[must_use]
    pub const fn is_stored(&self) -> bool {
        matches!(self, Self::Stored)
    }
}

/// Outcome of [`ResponseCache::delete`] and [`ResponseCache::delete_by_prefix`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheDelete {
    /// Number of entries that existed and were removed.
    Deleted(u64),
    Degraded(DegradedReason),
}

impl CacheDelete {
    /// Entries removed, zero when degraded.
    #[must_use]
    pub const fn deleted(&self) -> u64 {
        match self {
            Self::Deleted(count) => *count,
            Self::Degraded(_) => 0,
        }
    }
}

/// Facade settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// TTL used when the caller does not pass one.
    pub default_ttl: Duration,
    /// Prepended to every key. Empty means no namespacing.
    pub key_prefix: String,
    /// Largest encoded payload that will be written.
    pub max_payload_bytes: usize,
    /// Upper bound on a single store round-trip.
    pub operation_timeout: Duration,
    /// Remove entries whose payload fails to parse.
    pub delete_on_corruption: bool,
    /// Let memoized calls cache under keys with unfilled identity placeholders.
    pub cache_anonymous: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default(), &RedisConfig::default())
    }
}

impl CacheSettings {
    /// Builds settings from the configuration sections.
    #[must_use]
    pub fn from_config(cache: &CacheConfig, redis: &RedisConfig) -> Self {
        Self {
            default_ttl: cache.default_ttl(),
            key_prefix: cache.key_prefix.clone(),
            max_payload_bytes: cache.max_payload_bytes,
            operation_timeout: redis.operation_timeout(),
            delete_on_corruption: cache.delete_on_corruption,
            cache_anonymous: cache.cache_anonymous,
        }
    }
}

/// Cache facade over a key-value store.
pub struct ResponseCache {
    store: Arc<dyn KeyValueStore>,
    settings: CacheSettings,
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("enabled", &self.is_enabled())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl ResponseCache {
    /// Create a new facade.
    pub fn new(store: Arc<dyn KeyValueStore>, settings: CacheSettings) -> Self {
        Self { store, settings }
    }

    #[must_use]
    pub const fn settings(&self) -> &CacheSettings {
        &self.settings
    }

    /// The process-wide default TTL.
    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.settings.default_ttl
    }

    /// Whether the underlying store is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.store.is_enabled()
    }

    /// Look up a key.
    pub async fn get(&self, key: &str) -> CacheLookup {
        if !self.is_enabled() {
            return CacheLookup::Degraded(self.degraded("get", key, DegradedReason::Disabled));
        }

        let full_key = self.namespaced(key);
        let raw = match self.bounded(self.store.get_raw(&full_key)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache miss for key '{}'", key);
                record_miss();
                return CacheLookup::Miss;
            }
            Err(e) => {
                let reason = DegradedReason::StoreUnavailable(e.to_string());
                return CacheLookup::Degraded(self.degraded("get", key, reason));
            }
        };

        match codec::from_wire(&raw) {
            Ok(value) => {
                debug!("Cache hit for key '{}'", key);
                record_hit();
                CacheLookup::Hit(value)
            }
            Err(e) => {
                if self.settings.delete_on_corruption {
                    if let Err(err) = self.bounded(self.store.delete(&full_key)).await {
                        debug!("Failed to delete corrupt entry '{}': {}", key, err);
                    }
                }
                let reason = DegradedReason::CorruptPayload(e.to_string());
                CacheLookup::Degraded(self.degraded("get", key, reason))
            }
        }
    }

    /// Store a value with the default TTL.
    pub async fn set(&self, key: &str, value: &CacheValue) -> CacheWrite {
        self.set_with_ttl(key, value, self.settings.default_ttl).await
    }

    /// Store a value with an explicit TTL.
    pub async fn set_with_ttl(&self, key: &str, value: &CacheValue, ttl: Duration) -> CacheWrite {
        if !self.is_enabled() {
            return CacheWrite::Degraded(self.degraded("set", key, DegradedReason::Disabled));
        }
        if ttl.is_zero() {
            return CacheWrite::Degraded(self.degraded("set", key, DegradedReason::ZeroTtl));
        }

        let payload = codec::to_wire(value);

        let limit = self.settings.max_payload_bytes;
        if payload.len() > limit {
            let reason = DegradedReason::PayloadTooLarge {
                size: payload.len(),
                limit,
            };
            return CacheWrite::Degraded(self.degraded("set", key, reason));
        }

        let full_key = self.namespaced(key);
        match self.bounded(self.store.set_raw(&full_key, &payload, ttl)).await {
            Ok(()) => {
                debug!("Cached key '{}' with TTL {:?}", key, ttl);
                record_write(payload.len());
                CacheWrite::Stored
            }
            Err(e) => {
                let reason = DegradedReason::StoreUnavailable(e.to_string());
                CacheWrite::Degraded(self.degraded("set", key, reason))
            }
        }
    }

    /// Remove a key. Removing an absent key is not an error.
    pub async fn delete(&self, key: &str) -> CacheDelete {
        if !self.is_enabled() {
            return CacheDelete::Degraded(self.degraded("delete", key, DegradedReason::Disabled));
        }

        match self.bounded(self.store.delete(&self.namespaced(key))).await {
            Ok(existed) => {
                debug!("Deleted key '{}': {}", key, existed);
                CacheDelete::Deleted(u64::from(existed))
            }
            Err(e) => {
                let reason = DegradedReason::StoreUnavailable(e.to_string());
                CacheDelete::Degraded(self.degraded("delete", key, reason))
            }
        }
    }

    /// Remove every key starting with `prefix`.
    ///
    /// Not atomic: an entry written under the prefix while the scan runs
    /// may survive.
    pub async fn delete_by_prefix(&self, prefix: &str) -> CacheDelete {
        if !self.is_enabled() {
            return CacheDelete::Degraded(self.degraded(
                "delete_by_prefix",
                prefix,
                DegradedReason::Disabled,
            ));
        }

        let full_prefix = self.namespaced(prefix);
        let keys = match self.bounded(self.store.scan_prefix(&full_prefix)).await {
            Ok(keys) => keys,
            Err(e) => {
                let reason = DegradedReason::StoreUnavailable(e.to_string());
                return CacheDelete::Degraded(self.degraded("delete_by_prefix", prefix, reason));
            }
        };

        if keys.is_empty() {
            debug!("No keys matching prefix '{}'", prefix);
            return CacheDelete::Deleted(0);
        }

        match self.bounded(self.store.delete_many(&keys)).await {
            Ok(deleted) => {
                info!("Invalidated {} keys matching prefix '{}'", deleted, prefix);
                record_invalidated(deleted);
                CacheDelete::Deleted(deleted)
            }
            Err(e) => {
                let reason = DegradedReason::StoreUnavailable(e.to_string());
                CacheDelete::Degraded(self.degraded("delete_by_prefix", prefix, reason))
            }
        }
    }

    /// Remove every entry under the configured key prefix.
    ///
    /// With an empty `key_prefix` this removes every key in the store,
    /// including keys other applications wrote.
    pub async fn clear(&self) -> CacheDelete {
        if self.settings.key_prefix.is_empty() && self.is_enabled() {
            warn!("Clearing the cache without a key prefix removes every key in the store");
        }
        self.delete_by_prefix("").await
    }

    /// Remove every cached book view.
    pub async fn invalidate_books(&self) -> CacheDelete {
        self.delete_by_prefix(keys::BOOK_PREFIX).await
    }

    /// Wrap computations so their results are cached under `template`.
    pub fn memoize(self: &Arc<Self>, template: impl Into<KeyTemplate>) -> Memoizer {
        Memoizer::new(Arc::clone(self), template.into())
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.settings.key_prefix, key)
    }

    async fn bounded<T>(&self, operation: impl Future<Output = FolioResult<T>>) -> FolioResult<T> {
        let limit = self.settings.operation_timeout;
        tokio::time::timeout(limit, operation)
            .await
            .map_err(|_| FolioError::Timeout(format!("Cache operation timed out after {:?}", limit)))?
    }

    fn degraded(&self, operation: &'static str, key: &str, reason: DegradedReason) -> DegradedReason {
        if matches!(reason, DegradedReason::Disabled) {
            debug!("Cache {} skipped for key '{}': {}", operation, key, reason);
        } else {
            warn!("Cache {} degraded for key '{}': {}", operation, key, reason);
        }
        record_degraded(operation, reason.label());
        reason
    }
}
