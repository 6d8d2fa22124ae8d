//! Behavior tests for the result cache.
//!
//! These verify the externally observable cache contract: TTL visibility
//! boundaries, LRU eviction under capacity pressure, and canonical key
//! derivation.

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::json;
use snoofeed_core::{cache_key, CachedFetcher, ResultCache};

// =============================================================================
// TTL visibility
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_queried_before_its_ttl_an_entry_is_visible() {
    // Given: an entry inserted with a 120s TTL
    let cache = ResultCache::new(10, Duration::from_secs(300));
    cache
        .set(String::from("k"), json!("v"), Some(Duration::from_secs(120)))
        .await;

    // When: time advances to just inside the boundary
    tokio::time::advance(Duration::from_secs(119)).await;

    // Then: the entry is still served
    assert_eq!(cache.get("k").await, Some(json!("v")));
}

#[tokio::test(start_paused = true)]
async fn when_query_time_reaches_insert_plus_ttl_the_entry_is_absent() {
    let cache = ResultCache::new(10, Duration::from_secs(300));
    cache
        .set(String::from("k"), json!("v"), Some(Duration::from_secs(120)))
        .await;

    // Exactly at insert + ttl counts as expired.
    tokio::time::advance(Duration::from_secs(120)).await;

    assert_eq!(cache.get("k").await, None);
}

// =============================================================================
// LRU eviction
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_capacity_overflows_exactly_the_least_recently_touched_key_goes() {
    // Given: a full cache where reads reorder recency: touch order is
    // c, a, b, so "c" is NOT the oldest insert but "a" is not LRU either.
    let cache = ResultCache::new(3, Duration::from_secs(300));
    cache.set(String::from("a"), json!(1), None).await;
    cache.set(String::from("b"), json!(2), None).await;
    cache.set(String::from("c"), json!(3), None).await;

    assert!(cache.get("c").await.is_some());
    assert!(cache.get("a").await.is_some());
    assert!(cache.get("b").await.is_some());

    // When: one more insert overflows the capacity
    cache.set(String::from("d"), json!(4), None).await;

    // Then: exactly one eviction happened, and the victim is "c", the least
    // recently touched at eviction time
    let stats = cache.stats().await;
    assert_eq!(stats.evictions, 1);
    assert_eq!(stats.size, 3);
    assert!(cache.get("c").await.is_none());
    assert!(cache.get("a").await.is_some());
    assert!(cache.get("b").await.is_some());
    assert!(cache.get("d").await.is_some());
}

// =============================================================================
// Key derivation
// =============================================================================

#[test]
fn equivalent_calls_with_reordered_arguments_share_a_key() {
    let mut forward = BTreeMap::new();
    forward.insert(String::from("subreddit"), json!("rust"));
    forward.insert(String::from("sort"), json!("hot"));
    forward.insert(String::from("limit"), json!(25));

    let mut reversed = BTreeMap::new();
    reversed.insert(String::from("limit"), json!(25));
    reversed.insert(String::from("sort"), json!("hot"));
    reversed.insert(String::from("subreddit"), json!("rust"));

    assert_eq!(
        cache_key("subreddit_feed", &forward),
        cache_key("subreddit_feed", &reversed)
    );
}

#[test]
fn structurally_different_calls_never_share_a_key() {
    let mut args = BTreeMap::new();
    args.insert(String::from("subreddit"), json!("rust"));

    let mut other = args.clone();
    other.insert(String::from("limit"), json!(25));

    assert_ne!(cache_key("subreddit_feed", &args), cache_key("subreddit_feed", &other));
    assert_ne!(cache_key("subreddit_feed", &args), cache_key("subreddit_about", &args));
}

// =============================================================================
// In-flight deduplication
// =============================================================================

#[tokio::test(start_paused = true)]
async fn concurrent_misses_for_one_key_share_a_single_fetch() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let fetcher = CachedFetcher::new(ResultCache::new(10, Duration::from_secs(300)));
    let fetches = Arc::new(AtomicUsize::new(0));

    let fetch = |fetches: Arc<AtomicUsize>| async move {
        fetches.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok::<_, snoofeed_core::FetchError>(json!({"payload": true}))
    };

    let (a, b, c, d) = tokio::join!(
        fetcher.fetch("hot-key", None, || fetch(Arc::clone(&fetches))),
        fetcher.fetch("hot-key", None, || fetch(Arc::clone(&fetches))),
        fetcher.fetch("hot-key", None, || fetch(Arc::clone(&fetches))),
        fetcher.fetch("other-key", None, || fetch(Arc::clone(&fetches))),
    );

    assert!(a.is_ok() && b.is_ok() && c.is_ok() && d.is_ok());
    // Three callers of "hot-key" collapse to one fetch; "other-key" is its own.
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}
