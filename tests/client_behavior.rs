//! Behavior tests for the retrying Reddit client.
//!
//! The transport is a scripted double, the clock is tokio's paused clock, so
//! every retry delay is measured exactly.

use std::sync::Arc;
use std::time::Duration;

use snoofeed_core::{
    Config, FetchErrorKind, HttpError, HttpResponse, RateLimiter, RedditClient,
};
use snoofeed_tests::MockHttpClient;

fn client_over(mock: &Arc<MockHttpClient>, limiter: RateLimiter) -> RedditClient {
    RedditClient::new(
        Arc::clone(mock) as Arc<dyn snoofeed_core::HttpClient>,
        Arc::new(limiter),
        &Config::default(),
    )
}

// =============================================================================
// Retry schedule
// =============================================================================

#[tokio::test(start_paused = true)]
async fn two_timeouts_then_success_returns_the_result_after_backing_off() {
    // Given: a transport that times out twice before answering
    let mock = Arc::new(MockHttpClient::new());
    mock.push_error(HttpError::timeout("simulated timeout"));
    mock.push_error(HttpError::timeout("simulated timeout"));
    mock.push_ok(r#"{"ok": true}"#);
    let client = client_over(&mock, RateLimiter::disabled());

    // When: the call runs with a 1s/2x/no-jitter backoff policy
    let started = tokio::time::Instant::now();
    let payload = client.get_json("/r/rust/hot", &[]).await.unwrap();
    let elapsed = started.elapsed();

    // Then: the third attempt's payload comes back, and the simulated delay
    // is exactly initial + initial*2
    assert_eq!(payload["ok"], true);
    assert_eq!(mock.call_count(), 3);
    assert_eq!(elapsed, Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn server_errors_exhaust_retries_and_carry_the_last_status() {
    let mock = Arc::new(MockHttpClient::new());
    for _ in 0..4 {
        mock.push_response(HttpResponse::ok_json("").with_status(503));
    }
    let client = client_over(&mock, RateLimiter::disabled());

    let error = client.get_json("/r/rust/hot", &[]).await.unwrap_err();

    // max_retries = 3 means four attempts in total.
    assert_eq!(mock.call_count(), 4);
    assert_eq!(error.kind(), FetchErrorKind::Network);
    assert_eq!(error.status(), Some(503));
}

// =============================================================================
// Terminal failures
// =============================================================================

#[tokio::test(start_paused = true)]
async fn a_403_fails_immediately_with_zero_retries() {
    let mock = Arc::new(MockHttpClient::new());
    mock.push_response(HttpResponse::ok_json("").with_status(403));
    let client = client_over(&mock, RateLimiter::disabled());

    let started = tokio::time::Instant::now();
    let error = client.get_json("/r/private/hot", &[]).await.unwrap_err();

    assert_eq!(error.kind(), FetchErrorKind::Forbidden);
    assert_eq!(mock.call_count(), 1);
    assert_eq!(started.elapsed(), Duration::ZERO, "no backoff was taken");
}

#[tokio::test(start_paused = true)]
async fn a_404_maps_to_not_found_without_retry() {
    let mock = Arc::new(MockHttpClient::new());
    mock.push_response(HttpResponse::ok_json("").with_status(404));
    let client = client_over(&mock, RateLimiter::disabled());

    let error = client.get_json("/r/doesnotexist/about", &[]).await.unwrap_err();

    assert_eq!(error.kind(), FetchErrorKind::NotFound);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn an_unbuildable_request_never_retries() {
    let mock = Arc::new(MockHttpClient::new());
    mock.push_error(HttpError::fatal("bad url"));
    let client = client_over(&mock, RateLimiter::disabled());

    let error = client.get_json("/whatever", &[]).await.unwrap_err();

    assert_eq!(error.kind(), FetchErrorKind::Network);
    assert!(!error.retryable());
    assert_eq!(mock.call_count(), 1);
}

// =============================================================================
// 429 handling
// =============================================================================

#[tokio::test(start_paused = true)]
async fn a_429_prefers_the_service_retry_after_over_computed_backoff() {
    let mock = Arc::new(MockHttpClient::new());
    mock.push_response(
        HttpResponse::ok_json("")
            .with_status(429)
            .with_header("retry-after", "5.0"),
    );
    mock.push_ok("{}");
    let client = client_over(&mock, RateLimiter::disabled());

    let started = tokio::time::Instant::now();
    client.get_json("/r/rust/hot", &[]).await.unwrap();

    // Backoff would have waited 1s; the service said 5.
    assert_eq!(started.elapsed(), Duration::from_secs(5));
    assert_eq!(mock.call_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn persistent_throttling_surfaces_rate_limited_with_the_wait_hint() {
    let mock = Arc::new(MockHttpClient::new());
    for _ in 0..4 {
        mock.push_response(
            HttpResponse::ok_json("")
                .with_status(429)
                .with_header("retry-after", "1.0"),
        );
    }
    let client = client_over(&mock, RateLimiter::disabled());

    let error = client.get_json("/r/rust/hot", &[]).await.unwrap_err();

    assert_eq!(error.kind(), FetchErrorKind::RateLimited);
    assert_eq!(error.retry_after(), Some(Duration::from_secs(1)));
    assert_eq!(mock.call_count(), 4);
}

// =============================================================================
// Limiter cooperation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn quota_exhaustion_headers_pace_the_next_call() {
    // Given: a limiter with ample local tokens
    let mock = Arc::new(MockHttpClient::new());
    mock.push_response(
        HttpResponse::ok_json("{}")
            .with_header("x-ratelimit-remaining", "0.0")
            .with_header("x-ratelimit-reset", "30.0"),
    );
    mock.push_ok("{}");
    let client = client_over(&mock, RateLimiter::new(100, Duration::from_secs(60)));

    // When: the first response reports the quota is spent
    client.get_json("/r/rust/hot", &[]).await.unwrap();

    // Then: the next call waits out the service's reset horizon
    let started = tokio::time::Instant::now();
    client.get_json("/r/rust/new", &[]).await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(29));
}
