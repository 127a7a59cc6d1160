//! Memoization of async computations.
//!
//! A [`Memoizer`] pairs a key template with the cache facade. Each call
//! resolves the key from its arguments and the caller's identity, answers
//! from the cache on a hit and otherwise runs the computation and caches
//! its result. On a hit the computation is never polled.

use crate::codec::CacheValue;
use crate::facade::{CacheLookup, CacheWrite, ResponseCache};
use crate::metrics::record_bypass;
use crate::template::{CallArgs, KeyTemplate};
use folio_core::Principal;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Caches the results of computations under a templated key.
///
/// When the resolved key lacks `{user_id}` or `{role}` because there is no
/// principal, the call bypasses the cache entirely so anonymous callers
/// never share an entry. Set `cache_anonymous` to cache under the literal
/// key instead.
#[derive(Debug, Clone)]
pub struct Memoizer {
    cache: Arc<ResponseCache>,
    template: KeyTemplate,
    ttl: Option<Duration>,
}

impl Memoizer {
    pub fn new(cache: Arc<ResponseCache>, template: KeyTemplate) -> Self {
        Self {
            cache,
            template,
            ttl: None,
        }
    }

    /// Overrides the facade's default TTL for entries written by this memoizer.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    #[must_use]
    pub const fn template(&self) -> &KeyTemplate {
        &self.template
    }

    /// The key a call would use, or `None` when the call bypasses the cache.
    #[must_use]
    pub fn resolve_key(&self, args: &CallArgs, identity: Option<&Principal>) -> Option<String> {
        let resolved = self.template.resolve(args, identity);

        if resolved.missing_identity() && !self.cache.settings().cache_anonymous {
            debug!(
                "Bypassing cache for '{}': no identity to fill the key",
                self.template
            );
            record_bypass();
            return None;
        }

        if !resolved.is_complete() {
            debug!(
                "Key '{}' keeps unresolved placeholders {:?}",
                resolved.key, resolved.unresolved
            );
        }
        Some(resolved.key)
    }

    /// Returns the cached value, or runs `computation` and caches its result.
    pub async fn call<F, Fut>(
        &self,
        args: &CallArgs,
        identity: Option<&Principal>,
        computation: F,
    ) -> CacheValue
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CacheValue>,
    {
        let result = self
            .try_call(args, identity, move || async move {
                Ok::<_, Infallible>(computation().await)
            })
            .await;

        match result {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Like [`call`](Self::call) for fallible computations.
    ///
    /// The computation's error is returned unchanged and nothing is cached.
    pub async fn try_call<F, Fut, E>(
        &self,
        args: &CallArgs,
        identity: Option<&Principal>,
        computation: F,
    ) -> Result<CacheValue, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CacheValue, E>>,
    {
        let Some(key) = self.resolve_key(args, identity) else {
            return computation().await;
        };

        if let CacheLookup::Hit(value) = self.cache.get(&key).await {
            return Ok(value);
        }

        let value = computation().await?;

        let ttl = self.ttl.unwrap_or_else(|| self.cache.default_ttl());
        if let CacheWrite::Degraded(reason) = self.cache.set_with_ttl(&key, &value, ttl).await {
            debug!("Result for '{}' returned uncached: {}", key, reason);
        }

        Ok(value)
    }
}
