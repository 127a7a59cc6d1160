//! In-process key-value store.

use super::KeyValueStore;
use async_trait::async_trait;
use folio_core::FolioResult;
use moka::{future::Cache, Expiry};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Entry {
    value: Arc<str>,
    ttl: Duration,
    expires_at: Instant,
}

impl Entry {
    fn new(value: &str, ttl: Duration) -> Self {
        Self {
            value: Arc::from(value),
            ttl,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self) -> bool {
        self.expires_at > Instant::now()
    }
}

/// Expires each entry after its own TTL. Overwriting a key restarts its
/// TTL, as `SETEX` does.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, value: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Key-value store living in process memory, backed by a moka cache.
///
/// Expired entries are invisible immediately and are evicted by moka's
/// housekeeping, whether or not the key is ever touched again.
pub struct MemoryStore {
    cache: Cache<String, Entry>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            cache: Cache::builder()
                .name("folio-memory-store")
                .expire_after(PerEntryTtl)
                .build(),
        }
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.iter().filter(|(_, entry)| entry.is_live()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries still held in memory, expired or not, after running
    /// pending evictions.
    pub async fn resident_entries(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    /// Writes a payload without going through the codec.
    ///
    /// Lets tests plant corrupted entries.
    pub async fn insert_raw(&self, key: impl Into<String>, value: &str, ttl: Duration) {
        self.cache.insert(key.into(), Entry::new(value, ttl)).await;
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn get_raw(&self, key: &str) -> FolioResult<Option<String>> {
        Ok(self
            .cache
            .get(key)
            .await
            .filter(Entry::is_live)
            .map(|entry| entry.value.to_string()))
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> FolioResult<()> {
        self.insert_raw(key, value, ttl).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> FolioResult<bool> {
        Ok(self.cache.remove(key).await.is_some_and(|entry| entry.is_live()))
    }

    async fn scan_prefix(&self, prefix: &str) -> FolioResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, entry)| key.starts_with(prefix) && entry.is_live())
            .map(|(key, _)| key.to_string())
            .collect();
        keys.sort_unstable();
        Ok(keys)
    }

    async fn delete_many(&self, keys: &[String]) -> FolioResult<u64> {
        let mut deleted = 0;
        for key in keys {
            if self.delete(key).await? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryStore::new();
        store.set_raw("book:1", "\"dune\"", Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.get_raw("book:1").await.unwrap().as_deref(), Some("\"dune\""));
        assert!(store.delete("book:1").await.unwrap());
        assert!(!store.delete("book:1").await.unwrap());
        assert!(store.get_raw("book:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let store = MemoryStore::new();
        store.set_raw("book:1", "1", Duration::from_millis(200)).await.unwrap();
        assert!(store.get_raw("book:1").await.unwrap().is_some());

        sleep(Duration::from_millis(300)).await;
        assert!(store.get_raw("book:1").await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_restarts_ttl() {
        let store = MemoryStore::new();
        store.set_raw("book:1", "1", Duration::from_millis(200)).await.unwrap();
        store.set_raw("book:1", "2", Duration::from_secs(60)).await.unwrap();

        sleep(Duration::from_millis(300)).await;
        assert_eq!(store.get_raw("book:1").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_expired_entries_are_reclaimed_without_reads() {
        let store = MemoryStore::new();
        for i in 0..200 {
            store
                .set_raw(&format!("book:{}", i), "x", Duration::from_millis(100))
                .await
                .unwrap();
        }
        store.set_raw("rentals:1", "y", Duration::from_secs(60)).await.unwrap();

        // Past the TTL and past moka's coarsest first-level timer bucket.
        sleep(Duration::from_millis(2_500)).await;

        assert_eq!(store.resident_entries().await, 1);
        assert_eq!(store.get_raw("rentals:1").await.unwrap().as_deref(), Some("y"));
    }

    #[tokio::test]
    async fn test_scan_prefix_is_literal() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);
        store.set_raw("book:1", "1", ttl).await.unwrap();
        store.set_raw("book:2", "2", ttl).await.unwrap();
        store.set_raw("book*x", "3", ttl).await.unwrap();
        store.set_raw("other:1", "4", ttl).await.unwrap();

        assert_eq!(
            store.scan_prefix("book:").await.unwrap(),
            vec!["book:1".to_string(), "book:2".to_string()]
        );
        assert_eq!(store.scan_prefix("book*").await.unwrap(), vec!["book*x".to_string()]);
        assert_eq!(store.scan_prefix("").await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_scan_skips_expired() {
        let store = MemoryStore::new();
        store.set_raw("book:1", "1", Duration::from_millis(100)).await.unwrap();
        store.set_raw("book:2", "2", Duration::from_secs(60)).await.unwrap();

        sleep(Duration::from_millis(200)).await;
        assert_eq!(store.scan_prefix("book:").await.unwrap(), vec!["book:2".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_many_counts_existing() {
        let store = MemoryStore::new();
        store.set_raw("a", "1", Duration::from_secs(60)).await.unwrap();
        store.set_raw("b", "2", Duration::from_secs(60)).await.unwrap();

        let deleted = store
            .delete_many(&["a".to_string(), "b".to_string(), "c".to_string()])
            .await
            .unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.len(), 0);
    }
}
