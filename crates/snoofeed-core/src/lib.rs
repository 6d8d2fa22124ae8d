//! # Snoofeed Core
//!
//! A resilient data-access layer for the public Reddit JSON API.
//!
//! ## Overview
//!
//! Reddit's unauthenticated endpoints are rate limited, occasionally flaky,
//! and loosely typed. This crate sits between a caller and those endpoints
//! and provides:
//!
//! - **Result caching** with TTL expiry, LRU eviction, and deduplication of
//!   concurrent misses for the same key
//! - **Token-bucket admission control** that also honors the service's own
//!   rate-limit feedback headers
//! - **A retrying transport** with exponential backoff over a pooled
//!   connection, classifying failures into typed errors
//! - **Tolerant parsing** of loosely-typed payloads into canonical records
//!   with defined defaults
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | TTL + LRU result cache, key derivation, cached fetcher |
//! | [`client`] | Retrying Reddit client and endpoint helpers |
//! | [`config`] | Environment-driven process configuration |
//! | [`domain`] | Typed records, validated names, tolerant coercion |
//! | [`error`] | Error taxonomy crossing the core boundary |
//! | [`http`] | Transport trait and pooled reqwest implementation |
//! | [`rate_limit`] | Token-bucket admission controller |
//! | [`service`] | Caller-facing cached operations |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use snoofeed_core::{RedditService, SubredditFeedRequest, SubredditName};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = RedditService::from_env();
//!
//!     let request = SubredditFeedRequest::new(SubredditName::parse("rust")?).with_limit(10);
//!     let feed = service.subreddit_feed(&request).await?;
//!
//!     for post in &feed.posts {
//!         println!("{:>6}  {}", post.stats.score, post.title);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Operations return [`CoreError`], which is either a [`ValidationError`]
//! (bad caller arguments, raised before any network activity) or a
//! [`FetchError`] whose [`FetchErrorKind`] distinguishes missing resources,
//! forbidden resources, exhausted rate limits, network faults, and parse
//! failures. Transient failures are retried internally; what escapes is
//! final.

pub mod cache;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod rate_limit;
pub mod service;

// Cache
pub use cache::{cache_key, CacheStats, CachedFetcher, ResultCache};

// Client
pub use client::RedditClient;

// Configuration
pub use config::{BackoffPolicy, CacheConfig, Config, RateLimitConfig, RedditConfig, RequestConfig};

// Domain models and vocabulary
pub use domain::{
    Author, Comment, CommentSort, ContentType, FeedSort, Metadata, PageCursors, Post, PostRef,
    SearchSort, Stats, SubredditInfo, SubredditName, SubredditRef, TimeFilter, UserSort, Username,
};

// Error types
pub use error::{CoreError, FetchError, FetchErrorKind, ValidationError};

// HTTP transport
pub use http::{
    HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
};

// Rate limiting
pub use rate_limit::{Admission, RateLimiter};

// Service operations
pub use service::{
    PostComments, PostCommentsRequest, RedditService, SearchRequest, SearchResults, SubredditFeed,
    SubredditFeedRequest, UserFeed, UserFeedRequest,
};
