//! Shared fixtures for cache integration tests.
//!
//! Everything runs against in-process stores, so no Redis is needed.

#![allow(dead_code)]

use async_trait::async_trait;
use folio_cache::{CacheSettings, KeyValueStore, MemoryStore, ResponseCache};
use folio_core::{FolioError, FolioResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A cache over a fresh [`MemoryStore`].
pub struct TestCache {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<ResponseCache>,
}

impl TestCache {
    pub fn new() -> Self {
        Self::with_settings(CacheSettings::default())
    }

    pub fn with_settings(settings: CacheSettings) -> Self {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(ResponseCache::new(store.clone(), settings));
        Self { store, cache }
    }
}

/// Store that serves reads normally but rejects every write.
#[derive(Default)]
pub struct ReadOnlyStore {
    inner: MemoryStore,
    rejected_writes: AtomicUsize,
}

impl ReadOnlyStore {
    pub fn rejected_writes(&self) -> usize {
        self.rejected_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for ReadOnlyStore {
    async fn get_raw(&self, key: &str) -> FolioResult<Option<String>> {
        self.inner.get_raw(key).await
    }

    async fn set_raw(&self, _key: &str, _value: &str, _ttl: Duration) -> FolioResult<()> {
        self.rejected_writes.fetch_add(1, Ordering::SeqCst);
        Err(FolioError::cache(
            "READONLY You can't write against a read only replica.",
        ))
    }

    async fn delete(&self, key: &str) -> FolioResult<bool> {
        self.inner.delete(key).await
    }

    async fn scan_prefix(&self, prefix: &str) -> FolioResult<Vec<String>> {
        self.inner.scan_prefix(prefix).await
    }

    async fn delete_many(&self, keys: &[String]) -> FolioResult<u64> {
        self.inner.delete_many(keys).await
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Store whose every operation fails as if Redis were unreachable.
pub struct UnreachableStore;

#[async_trait]
impl KeyValueStore for UnreachableStore {
    async fn get_raw(&self, _key: &str) -> FolioResult<Option<String>> {
        Err(unreachable_error())
    }

    async fn set_raw(&self, _key: &str, _value: &str, _ttl: Duration) -> FolioResult<()> {
        Err(unreachable_error())
    }

    async fn delete(&self, _key: &str) -> FolioResult<bool> {
        Err(unreachable_error())
    }

    async fn scan_prefix(&self, _prefix: &str) -> FolioResult<Vec<String>> {
        Err(unreachable_error())
    }

    async fn delete_many(&self, _keys: &[String]) -> FolioResult<u64> {
        Err(unreachable_error())
    }

    fn is_enabled(&self) -> bool {
        true
    }
}

fn unreachable_error() -> FolioError {
    FolioError::cache("Failed to get Redis connection: Connection refused (os error 111)")
}
