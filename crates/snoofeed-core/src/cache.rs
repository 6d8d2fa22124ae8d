//! Capacity- and TTL-bounded result cache with LRU eviction.
//!
//! One `tokio::sync::Mutex` serializes every operation; reads take the same
//! lock because a hit reorders recency. The lock is held only for the map
//! mutation itself, never across a fetch, so cancellation between operations
//! cannot corrupt the store.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::CacheConfig;
use crate::error::FetchError;

/// Build a stable cache key from an operation name and its arguments.
///
/// The argument map renders as canonical JSON with sorted keys, so
/// equivalent calls collide regardless of the order arguments were supplied
/// in, and structurally different calls never collide.
pub fn cache_key(operation: &str, args: &BTreeMap<String, Value>) -> String {
    let encoded = serde_json::to_string(args).expect("a string-keyed JSON map always serializes");
    format!("{operation}:{encoded}")
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
    hit_count: u64,
}

/// Counters reported by [`ResultCache::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub hit_rate: f64,
}

#[derive(Debug, Default)]
struct CacheInner {
    map: HashMap<String, CacheEntry>,
    /// Recency order: front = least recently used, back = most recent.
    /// Reordering is O(n) over the access queue, acceptable at the
    /// configured capacities (hundreds of entries).
    access_order: VecDeque<String>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl CacheInner {
    fn promote(&mut self, key: &str) {
        if let Some(position) = self.access_order.iter().position(|entry| entry == key) {
            self.access_order.remove(position);
        }
        self.access_order.push_back(key.to_string());
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        if self.map.remove(key).is_none() {
            return false;
        }
        if let Some(position) = self.access_order.iter().position(|entry| entry == key) {
            self.access_order.remove(position);
        }
        true
    }

    fn evict_lru(&mut self) {
        if let Some(oldest) = self.access_order.pop_front() {
            self.map.remove(&oldest);
            self.evictions += 1;
        }
    }

    fn record_hit(&mut self, key: &str) {
        if let Some(entry) = self.map.get_mut(key) {
            entry.hit_count += 1;
        }
        self.promote(key);
        self.hits += 1;
    }
}

/// Shared, bounded key/value store for fetched payloads.
#[derive(Debug, Clone)]
pub struct ResultCache {
    inner: Arc<Mutex<CacheInner>>,
    capacity: usize,
    default_ttl: Duration,
    enabled: bool,
}

impl ResultCache {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner::default())),
            capacity,
            default_ttl,
            enabled: capacity > 0 && !default_ttl.is_zero(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        let mut cache = Self::new(config.capacity, config.ttl);
        cache.enabled = cache.enabled && config.enabled;
        cache
    }

    /// A cache that stores nothing and always misses.
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Look up a live entry. An expired entry counts as a miss and is
    /// removed on the spot; a hit promotes the key to most-recently-used.
    pub async fn get(&self, key: &str) -> Option<Value> {
        if !self.enabled {
            return None;
        }

        let mut inner = self.inner.lock().await;
        let now = Instant::now();

        let Some(entry) = inner.map.get(key) else {
            inner.misses += 1;
            return None;
        };
        if now >= entry.expires_at {
            inner.remove_entry(key);
            inner.misses += 1;
            return None;
        }

        let value = entry.value.clone();
        inner.record_hit(key);
        Some(value)
    }

    /// Insert or replace an entry, evicting from the least-recently-used end
    /// until the store fits its capacity. Eviction ignores TTL: capacity
    /// pressure removes fresh entries too.
    pub async fn set(&self, key: String, value: Value, ttl: Option<Duration>) {
        if !self.enabled {
            return;
        }
        let ttl = ttl.unwrap_or(self.default_ttl);
        if ttl.is_zero() {
            return;
        }

        let mut inner = self.inner.lock().await;
        let expires_at = Instant::now() + ttl;
        inner.map.insert(
            key.clone(),
            CacheEntry {
                value,
                expires_at,
                hit_count: 0,
            },
        );
        inner.promote(&key);
        while inner.map.len() > self.capacity {
            inner.evict_lru();
        }
    }

    /// Drop a single entry. Returns whether it was present.
    pub async fn invalidate(&self, key: &str) -> bool {
        let mut inner = self.inner.lock().await;
        inner.remove_entry(key)
    }

    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.map.clear();
        inner.access_order.clear();
    }

    /// Sweep out every expired entry, returning how many were removed.
    pub async fn cleanup_expired(&self) -> usize {
        let mut inner = self.inner.lock().await;
        let now = Instant::now();
        let expired: Vec<String> = inner
            .map
            .iter()
            .filter(|(_, entry)| now >= entry.expires_at)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            inner.remove_entry(key);
        }
        expired.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().await;
        let lookups = inner.hits + inner.misses;
        CacheStats {
            size: inner.map.len(),
            max_size: self.capacity,
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            hit_rate: if lookups > 0 {
                inner.hits as f64 / lookups as f64
            } else {
                0.0
            },
        }
    }
}

/// Cache-through wrapper for fetch-and-parse operations.
///
/// Concurrent misses for the same key collapse into a single underlying
/// fetch: the first caller fetches while holding a per-key guard, and
/// waiters re-check the cache once the guard releases. Failures are never
/// cached, so a waiter that observes a failed fetch simply fetches again
/// itself.
#[derive(Debug, Clone)]
pub struct CachedFetcher {
    cache: ResultCache,
    in_flight: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl CachedFetcher {
    pub fn new(cache: ResultCache) -> Self {
        Self {
            cache,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Return the cached value for `key`, or run `fetch_fn` and cache its
    /// success under `key` with `ttl` (falling back to the default TTL).
    pub async fn fetch<F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        fetch_fn: F,
    ) -> Result<Value, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, FetchError>>,
    {
        if !self.cache.enabled {
            return fetch_fn().await;
        }
        if let Some(hit) = self.cache.get(key).await {
            return Ok(hit);
        }

        let guard = {
            let mut in_flight = self.in_flight.lock().await;
            Arc::clone(in_flight.entry(key.to_string()).or_default())
        };

        let result = {
            let _held = guard.lock().await;
            match self.cache.get(key).await {
                // Another caller populated the key while we queued.
                Some(hit) => Ok(hit),
                None => {
                    let result = fetch_fn().await;
                    if let Ok(value) = &result {
                        self.cache.set(key.to_string(), value.clone(), ttl).await;
                    }
                    result
                }
            }
        };

        // Drop the guard entry once no other caller still references it. A
        // newcomer racing this cleanup creates a fresh guard, which at worst
        // costs one duplicate fetch, never a wrong result.
        let mut in_flight = self.in_flight.lock().await;
        if let Some(entry) = in_flight.get(key) {
            if Arc::strong_count(entry) == 2 {
                in_flight.remove(key);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn entries_are_visible_until_their_ttl() {
        let cache = ResultCache::new(10, Duration::from_secs(60));
        cache.set(String::from("k"), json!(1), None).await;

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get("k").await, Some(json!(1)));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get("k").await, None);
        assert_eq!(cache.len().await, 0, "expired entry is purged on access");
    }

    #[tokio::test(start_paused = true)]
    async fn overflow_evicts_the_least_recently_touched_key() {
        let cache = ResultCache::new(3, Duration::from_secs(60));
        cache.set(String::from("a"), json!("a"), None).await;
        cache.set(String::from("b"), json!("b"), None).await;
        cache.set(String::from("c"), json!("c"), None).await;

        // Touch "a" so "b" becomes the LRU victim.
        assert!(cache.get("a").await.is_some());

        cache.set(String::from("d"), json!("d"), None).await;

        assert_eq!(cache.len().await, 3);
        assert!(cache.get("b").await.is_none(), "b was least recently used");
        assert!(cache.get("a").await.is_some());
        assert!(cache.get("c").await.is_some());
        assert!(cache.get("d").await.is_some());
        assert_eq!(cache.stats().await.evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn eviction_ignores_remaining_ttl() {
        let cache = ResultCache::new(1, Duration::from_secs(3600));
        cache.set(String::from("fresh"), json!(1), None).await;
        cache.set(String::from("newer"), json!(2), None).await;

        assert!(cache.get("fresh").await.is_none());
        assert!(cache.get("newer").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn replacing_a_key_does_not_grow_the_cache() {
        let cache = ResultCache::new(2, Duration::from_secs(60));
        cache.set(String::from("k"), json!(1), None).await;
        cache.set(String::from("k"), json!(2), None).await;

        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.get("k").await, Some(json!(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn per_entry_ttl_overrides_the_default() {
        let cache = ResultCache::new(10, Duration::from_secs(3600));
        cache
            .set(String::from("short"), json!(1), Some(Duration::from_secs(5)))
            .await;

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(cache.get("short").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_sweeps_only_expired_entries() {
        let cache = ResultCache::new(10, Duration::from_secs(10));
        cache.set(String::from("old"), json!(1), None).await;
        tokio::time::advance(Duration::from_secs(7)).await;
        cache.set(String::from("young"), json!(2), None).await;
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(cache.cleanup_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("young").await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn invalidate_reports_whether_a_key_was_present() {
        let cache = ResultCache::new(10, Duration::from_secs(60));
        cache.set(String::from("k"), json!(1), None).await;

        assert!(cache.invalidate("k").await);
        assert!(!cache.invalidate("k").await);
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn clear_empties_the_store() {
        let cache = ResultCache::new(10, Duration::from_secs(60));
        cache.set(String::from("a"), json!(1), None).await;
        cache.set(String::from("b"), json!(2), None).await;

        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn disabled_cache_stores_nothing() {
        let cache = ResultCache::disabled();
        cache.set(String::from("k"), json!(1), None).await;
        assert!(cache.get("k").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stats_track_hits_misses_and_rate() {
        let cache = ResultCache::new(10, Duration::from_secs(60));
        cache.set(String::from("k"), json!(1), None).await;

        assert!(cache.get("k").await.is_some());
        assert!(cache.get("absent").await.is_none());

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn cache_key_is_argument_order_independent() {
        let mut first = BTreeMap::new();
        first.insert(String::from("limit"), json!(25));
        first.insert(String::from("sort"), json!("hot"));

        let mut second = BTreeMap::new();
        second.insert(String::from("sort"), json!("hot"));
        second.insert(String::from("limit"), json!(25));

        assert_eq!(cache_key("feed", &first), cache_key("feed", &second));
        assert_ne!(cache_key("feed", &first), cache_key("search", &first));

        second.insert(String::from("after"), json!("t3_x"));
        assert_ne!(cache_key("feed", &first), cache_key("feed", &second));
    }

    #[tokio::test(start_paused = true)]
    async fn fetcher_returns_cached_values_without_refetching() {
        let fetcher = CachedFetcher::new(ResultCache::new(10, Duration::from_secs(60)));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = fetcher
                .fetch("op:{}", None, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(json!("payload"))
                })
                .await
                .unwrap();
            assert_eq!(value, json!("payload"));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fetcher_never_caches_a_failure() {
        let fetcher = CachedFetcher::new(ResultCache::new(10, Duration::from_secs(60)));
        let calls = AtomicUsize::new(0);

        let failed = fetcher
            .fetch("op:{}", None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::network("boom"))
            })
            .await;
        assert!(failed.is_err());

        let recovered = fetcher
            .fetch("op:{}", None, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(json!(2))
            })
            .await
            .unwrap();
        assert_eq!(recovered, json!(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_misses_for_one_key_fetch_once() {
        let fetcher = CachedFetcher::new(ResultCache::new(10, Duration::from_secs(60)));
        let calls = Arc::new(AtomicUsize::new(0));

        let slow_fetch = |calls: Arc<AtomicUsize>| async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok::<_, FetchError>(json!("shared"))
        };

        let (first, second, third) = tokio::join!(
            fetcher.fetch("same-key", None, || slow_fetch(Arc::clone(&calls))),
            fetcher.fetch("same-key", None, || slow_fetch(Arc::clone(&calls))),
            fetcher.fetch("same-key", None, || slow_fetch(Arc::clone(&calls))),
        );

        assert_eq!(first.unwrap(), json!("shared"));
        assert_eq!(second.unwrap(), json!("shared"));
        assert_eq!(third.unwrap(), json!("shared"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
