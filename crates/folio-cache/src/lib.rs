//! # Folio Cache
//!
//! Response memoization for the Folio library service.
//!
//! - [`codec`]: turns any [`CacheValue`] into a JSON-safe tree and back.
//! - [`store`]: the key-value store contract with Redis and in-process
//!   implementations.
//! - [`facade`]: best-effort get/set/delete over a store, reporting
//!   degradation instead of failing.
//! - [`template`] and [`memoize`]: per-call cache keys and the wrapper that
//!   skips recomputation on a hit.

pub mod codec;
pub mod facade;
pub mod keys;
pub mod memoize;
pub mod metrics;
pub mod response;
pub mod store;
pub mod template;

pub use codec::{CacheValue, OpaqueValue};
pub use facade::{CacheDelete, CacheLookup, CacheSettings, CacheWrite, DegradedReason, ResponseCache};
pub use memoize::Memoizer;
pub use response::CachedResponse;
pub use store::{create_pool, KeyValueStore, MemoryStore, RedisStore, RedisStoreParameters};
pub use template::{CallArgs, KeyTemplate, Placeholder, ResolvedKey, Segment};
