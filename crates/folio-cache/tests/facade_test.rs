//! Integration tests for the cache facade against an in-process store.

mod common;

use common::{TestCache, UnreachableStore};
use folio_cache::{
    CacheDelete, CacheLookup, CacheSettings, CacheValue, CachedResponse, DegradedReason,
    OpaqueValue, ResponseCache,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_set_then_repeated_get() {
    let t = TestCache::new();
    let value = CacheValue::from(json!({
        "books": [{"book_id": 1, "title": "Dune"}, {"book_id": 2, "title": "Emma"}],
        "total": 2,
        "next": null
    }));

    assert!(t.cache.set("book:list:1", &value).await.is_stored());
    for _ in 0..2 {
        assert_eq!(t.cache.get("book:list:1").await, CacheLookup::Hit(value.clone()));
    }
}

#[tokio::test]
async fn test_response_round_trips_all_fields() {
    let t = TestCache::new();
    let response = CachedResponse::new(200, "hello")
        .with_header("X", "1")
        .with_mimetype("text/plain")
        .with_direct_passthrough(false);

    t.cache
        .set("dashboard_view_7_admin", &CacheValue::Response(response.clone()))
        .await;

    let cached = t.cache.get("dashboard_view_7_admin").await.into_value();
    let Some(CacheValue::Response(replayed)) = cached else {
        panic!("expected a cached response, got {:?}", cached);
    };
    assert_eq!(replayed.status_code, 200);
    assert_eq!(replayed.data, "hello");
    assert_eq!(replayed.headers.get("X").map(String::as_str), Some("1"));
    assert_eq!(replayed.mimetype.as_deref(), Some("text/plain"));
    assert!(!replayed.direct_passthrough);
}

#[tokio::test]
async fn test_response_nested_in_mapping() {
    let t = TestCache::new();
    let mut map = std::collections::BTreeMap::new();
    map.insert("page".to_string(), CacheValue::from(1));
    map.insert(
        "rendered".to_string(),
        CacheValue::Response(CachedResponse::new(404, "missing")),
    );
    let value = CacheValue::Object(map);

    t.cache.set("nested", &value).await;
    assert_eq!(t.cache.get("nested").await.into_value(), Some(value));
}

#[tokio::test]
async fn test_opaque_value_comes_back_as_text() {
    #[derive(Debug)]
    struct Cursor {
        position: u64,
    }

    let t = TestCache::new();
    let opaque = OpaqueValue::from_debug(Cursor { position: 42 });
    let expected = CacheValue::String(opaque.repr());

    t.cache.set("cursor", &CacheValue::Opaque(opaque)).await;
    assert_eq!(t.cache.get("cursor").await.into_value(), Some(expected));
}

#[tokio::test]
async fn test_prefix_invalidation() {
    let t = TestCache::new();
    let a = CacheValue::from("a");
    let b = CacheValue::from("b");
    let c = CacheValue::from("c");

    t.cache.set("book:1", &a).await;
    t.cache.set("book:2", &b).await;
    t.cache.set("other:1", &c).await;

    assert_eq!(t.cache.delete_by_prefix("book:").await, CacheDelete::Deleted(2));
    assert_eq!(t.cache.get("book:1").await, CacheLookup::Miss);
    assert_eq!(t.cache.get("book:2").await, CacheLookup::Miss);
    assert_eq!(t.cache.get("other:1").await, CacheLookup::Hit(c));
}

#[tokio::test]
async fn test_prefix_is_matched_literally() {
    let t = TestCache::new();
    t.cache.set("book:*:1", &CacheValue::from(1)).await;
    t.cache.set("book:7:1", &CacheValue::from(2)).await;

    assert_eq!(t.cache.delete_by_prefix("book:*").await, CacheDelete::Deleted(1));
    assert!(t.cache.get("book:7:1").await.is_hit());
}

#[tokio::test]
async fn test_clear_removes_everything() {
    let t = TestCache::new();
    t.cache.set("book:1", &CacheValue::from(1)).await;
    t.cache.set("rentals:3", &CacheValue::from(2)).await;

    assert_eq!(t.cache.clear().await.deleted(), 2);
    assert!(t.store.is_empty());
}

#[tokio::test]
async fn test_entries_expire_after_default_ttl() {
    let t = TestCache::with_settings(CacheSettings {
        default_ttl: Duration::from_millis(300),
        ..CacheSettings::default()
    });
    t.cache.set("book:1", &CacheValue::from(1)).await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(t.cache.get("book:1").await.is_hit());

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(t.cache.get("book:1").await, CacheLookup::Miss);
}

#[tokio::test]
async fn test_outage_is_never_an_error() {
    let cache = ResponseCache::new(Arc::new(UnreachableStore), CacheSettings::default());

    assert!(matches!(
        cache.get("book:1").await,
        CacheLookup::Degraded(DegradedReason::StoreUnavailable(_))
    ));
    assert!(!cache.set("book:1", &CacheValue::from(1)).await.is_stored());
    assert_eq!(cache.delete("book:1").await.deleted(), 0);
    assert_eq!(cache.invalidate_books().await.deleted(), 0);
}
