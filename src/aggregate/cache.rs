//! Strict time-to-live memoization for slow telemetry sources.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// A cached value and the moment it was produced.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    pub value: T,
    pub stored_at: Instant,
}

impl<T> CacheEntry<T> {
    /// An entry is fresh while strictly less than `ttl` has elapsed.
    pub fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }
}

/// Keyed TTL cache.
///
/// Expired entries are never served: a miss awaits the producer and replaces
/// the old entry once it resolves. Whatever the producer returns is stored,
/// failures included, so a fresh failure is handed back without re-querying.
/// Concurrent misses on the same key are not coalesced; callers serialize
/// passes through `&mut self`.
#[derive(Debug)]
pub struct TtlCache<T> {
    entries: HashMap<String, CacheEntry<T>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Return the fresh value for `key`, or run `producer` and store its result.
    pub async fn cached_call<F, Fut>(&mut self, key: &str, ttl: Duration, producer: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if let Some(entry) = self.entries.get(key) {
            if entry.is_fresh(ttl, Instant::now()) {
                debug!(key, "cache hit");
                return entry.value.clone();
            }
        }

        debug!(key, ttl_ms = ttl.as_millis() as u64, "cache miss");
        let value = producer().await;
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.clone(),
                stored_at: Instant::now(),
            },
        );
        value
    }

    /// Look at an entry without refreshing it.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
