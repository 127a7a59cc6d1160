//! Prometheus-style metrics for the response cache.
//!
//! Recording is a no-op until the binary installs a recorder.

use ::metrics::{counter, describe_counter, describe_histogram, histogram};

/// Metric names for the response cache.
pub mod names {
    /// Lookups answered from the store.
    pub const CACHE_HITS_TOTAL: &str = "folio_cache_hits_total";
    /// Lookups that found nothing.
    pub const CACHE_MISSES_TOTAL: &str = "folio_cache_misses_total";
    /// Entries written.
    pub const CACHE_WRITES_TOTAL: &str = "folio_cache_writes_total";
    /// Operations that degraded instead of completing.
    pub const CACHE_DEGRADED_TOTAL: &str = "folio_cache_degraded_total";
    /// Keys removed by prefix invalidation.
    pub const CACHE_INVALIDATED_KEYS_TOTAL: &str = "folio_cache_invalidated_keys_total";
    /// Memoized calls that skipped the cache because the key was incomplete.
    pub const MEMO_BYPASS_TOTAL: &str = "folio_memo_bypass_total";
    /// Size of encoded payloads written.
    pub const CACHE_PAYLOAD_BYTES: &str = "folio_cache_payload_bytes";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(names::CACHE_HITS_TOTAL, "Total number of cache hits");
    describe_counter!(names::CACHE_MISSES_TOTAL, "Total number of cache misses");
    describe_counter!(names::CACHE_WRITES_TOTAL, "Total number of cache entries written");
    describe_counter!(
        names::CACHE_DEGRADED_TOTAL,
        "Total number of cache operations that degraded, by operation and reason"
    );
    describe_counter!(
        names::CACHE_INVALIDATED_KEYS_TOTAL,
        "Total number of keys removed by prefix invalidation"
    );
    describe_counter!(
        names::MEMO_BYPASS_TOTAL,
        "Total number of memoized calls computed without the cache"
    );
    describe_histogram!(
        names::CACHE_PAYLOAD_BYTES,
        "Size in bytes of encoded payloads written to the cache"
    );
}

pub(crate) fn record_hit() {
    counter!(names::CACHE_HITS_TOTAL).increment(1);
}

pub(crate) fn record_miss() {
    counter!(names::CACHE_MISSES_TOTAL).increment(1);
}

pub(crate) fn record_write(payload_bytes: usize) {
    counter!(names::CACHE_WRITES_TOTAL).increment(1);
    histogram!(names::CACHE_PAYLOAD_BYTES).record(payload_bytes as f64);
}

pub(crate) fn record_degraded(operation: &'static str, reason: &'static str) {
    counter!(
        names::CACHE_DEGRADED_TOTAL,
        "operation" => operation,
        "reason" => reason
    )
    .increment(1);
}

pub(crate) fn record_invalidated(keys: u64) {
    counter!(names::CACHE_INVALIDATED_KEYS_TOTAL).increment(keys);
}

pub(crate) fn record_bypass() {
    counter!(names::MEMO_BYPASS_TOTAL).increment(1);
}
