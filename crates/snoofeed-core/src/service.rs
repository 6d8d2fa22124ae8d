//! Caller-facing cached operations.
//!
//! Each operation validates its arguments, derives a canonical cache key,
//! and runs the fetch-and-parse pipeline through the [`CachedFetcher`], so a
//! repeat call inside the TTL window never touches the network. Failures are
//! never cached; the next call retries from scratch.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::cache::{cache_key, CacheStats, CachedFetcher, ResultCache};
use crate::client::RedditClient;
use crate::config::Config;
use crate::domain::listing;
use crate::domain::{
    Comment, CommentSort, ContentType, FeedSort, PageCursors, Post, SearchSort, SubredditInfo,
    SubredditName, TimeFilter, UserSort, Username,
};
use crate::error::{CoreError, FetchError, ValidationError};
use crate::http::{HttpClient, ReqwestHttpClient};
use crate::rate_limit::RateLimiter;

const DEFAULT_COMMENT_LIMIT: u32 = 100;
const MAX_COMMENT_LIMIT: u32 = 500;
const DEFAULT_REPLY_DEPTH: u32 = 2;
const MAX_REPLY_DEPTH: u32 = 10;

/// Subreddit (or frontpage) feed request.
#[derive(Debug, Clone)]
pub struct SubredditFeedRequest {
    pub subreddit: Option<SubredditName>,
    pub sort: FeedSort,
    pub time_filter: Option<TimeFilter>,
    /// `None` means the configured default; values clamp to the configured
    /// per-request maximum.
    pub limit: Option<u32>,
    pub after: Option<String>,
    pub before: Option<String>,
}

impl SubredditFeedRequest {
    pub fn new(subreddit: SubredditName) -> Self {
        Self {
            subreddit: Some(subreddit),
            sort: FeedSort::default(),
            time_filter: None,
            limit: None,
            after: None,
            before: None,
        }
    }

    pub fn frontpage() -> Self {
        Self {
            subreddit: None,
            sort: FeedSort::default(),
            time_filter: None,
            limit: None,
            after: None,
            before: None,
        }
    }

    pub fn with_sort(mut self, sort: FeedSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_time_filter(mut self, time_filter: TimeFilter) -> Self {
        self.time_filter = Some(time_filter);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_after(mut self, after: impl Into<String>) -> Self {
        self.after = Some(after.into());
        self
    }

    pub fn with_before(mut self, before: impl Into<String>) -> Self {
        self.before = Some(before.into());
        self
    }
}

/// Subreddit feed response with stable nesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubredditFeed {
    pub subreddit: Option<String>,
    pub sort: FeedSort,
    pub time_filter: Option<TimeFilter>,
    pub post_count: usize,
    pub posts: Vec<Post>,
    pub cursors: PageCursors,
}

/// User history request.
#[derive(Debug, Clone)]
pub struct UserFeedRequest {
    pub username: Username,
    pub content_type: ContentType,
    pub sort: UserSort,
    pub time_filter: Option<TimeFilter>,
    pub limit: Option<u32>,
    pub after: Option<String>,
}

impl UserFeedRequest {
    pub fn new(username: Username) -> Self {
        Self {
            username,
            content_type: ContentType::default(),
            sort: UserSort::default(),
            time_filter: None,
            limit: None,
            after: None,
        }
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_sort(mut self, sort: UserSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_time_filter(mut self, time_filter: TimeFilter) -> Self {
        self.time_filter = Some(time_filter);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_after(mut self, after: impl Into<String>) -> Self {
        self.after = Some(after.into());
        self
    }
}

/// User history response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFeed {
    pub username: String,
    pub content_type: ContentType,
    pub sort: UserSort,
    pub post_count: usize,
    pub comment_count: usize,
    pub posts: Vec<Post>,
    pub comments: Vec<Comment>,
    pub cursors: PageCursors,
}

/// Search request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub subreddit: Option<SubredditName>,
    pub sort: SearchSort,
    pub time_filter: Option<TimeFilter>,
    pub limit: Option<u32>,
    pub after: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            subreddit: None,
            sort: SearchSort::default(),
            time_filter: None,
            limit: None,
            after: None,
        }
    }

    pub fn in_subreddit(mut self, subreddit: SubredditName) -> Self {
        self.subreddit = Some(subreddit);
        self
    }

    pub fn with_sort(mut self, sort: SearchSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_time_filter(mut self, time_filter: TimeFilter) -> Self {
        self.time_filter = Some(time_filter);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_after(mut self, after: impl Into<String>) -> Self {
        self.after = Some(after.into());
        self
    }
}

/// Search response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub subreddit: Option<String>,
    pub sort: SearchSort,
    pub result_count: usize,
    pub posts: Vec<Post>,
    pub cursors: PageCursors,
}

/// Comment-page request.
#[derive(Debug, Clone)]
pub struct PostCommentsRequest {
    /// Post id, with or without the `t3_` prefix.
    pub post_id: String,
    pub subreddit: Option<SubredditName>,
    pub sort: CommentSort,
    /// Clamps to 500; `None` means 100.
    pub limit: Option<u32>,
    /// Reply depth, clamped to 10; `None` means 2. Depth 0 yields top-level
    /// comments with no replies.
    pub depth: Option<u32>,
}

impl PostCommentsRequest {
    pub fn new(post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            subreddit: None,
            sort: CommentSort::default(),
            limit: None,
            depth: None,
        }
    }

    pub fn in_subreddit(mut self, subreddit: SubredditName) -> Self {
        self.subreddit = Some(subreddit);
        self
    }

    pub fn with_sort(mut self, sort: CommentSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }
}

/// Comment-page response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostComments {
    pub post_id: String,
    pub sort: CommentSort,
    pub depth: u32,
    pub comment_count: usize,
    pub post: Option<Post>,
    pub comments: Vec<Comment>,
}

/// The data-access layer: cache in front of the resilient client in front of
/// the tolerant parser. One instance per process.
#[derive(Clone)]
pub struct RedditService {
    client: RedditClient,
    fetcher: CachedFetcher,
    config: Config,
}

impl RedditService {
    pub fn new(config: Config, http: Arc<dyn HttpClient>) -> Self {
        let rate_limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let cache = ResultCache::from_config(&config.cache);
        let client = RedditClient::new(http, rate_limiter, &config);
        Self {
            client,
            fetcher: CachedFetcher::new(cache),
            config,
        }
    }

    /// Service over a pooled production transport, configured from the
    /// environment.
    pub fn from_env() -> Self {
        let config = Config::from_env();
        let http = Arc::new(ReqwestHttpClient::new(&config.request));
        Self::new(config, http)
    }

    pub fn cache(&self) -> &ResultCache {
        self.fetcher.cache()
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.fetcher.cache().stats().await
    }

    pub async fn cleanup_expired(&self) -> usize {
        self.fetcher.cache().cleanup_expired().await
    }

    /// Posts from a subreddit, or the frontpage when the request names none.
    pub async fn subreddit_feed(
        &self,
        request: &SubredditFeedRequest,
    ) -> Result<SubredditFeed, CoreError> {
        let limit = self.effective_limit(request.limit);
        let subreddit_arg = request.subreddit.as_ref().map(SubredditName::as_str);

        let mut args = BTreeMap::new();
        args.insert(String::from("subreddit"), json!(subreddit_arg));
        args.insert(String::from("sort"), json!(request.sort.as_str()));
        args.insert(
            String::from("time_filter"),
            json!(request.time_filter.map(TimeFilter::as_str)),
        );
        args.insert(String::from("limit"), json!(limit));
        args.insert(String::from("after"), json!(request.after));
        args.insert(String::from("before"), json!(request.before));
        let key = cache_key("subreddit_feed", &args);

        let value = self
            .fetcher
            .fetch(&key, None, || async {
                let payload = self
                    .client
                    .subreddit_listing(
                        request.subreddit.as_ref(),
                        request.sort,
                        request.time_filter,
                        limit,
                        request.after.as_deref(),
                        request.before.as_deref(),
                    )
                    .await?;

                let posts = listing::posts_from_listing(&payload);
                to_cache_value(&SubredditFeed {
                    subreddit: subreddit_arg.map(str::to_string),
                    sort: request.sort,
                    time_filter: request.time_filter,
                    post_count: posts.len(),
                    posts,
                    cursors: PageCursors::from_listing(&payload),
                })
            })
            .await?;

        from_cache_value(value)
    }

    /// A user's recent posts and/or comments.
    pub async fn user_feed(&self, request: &UserFeedRequest) -> Result<UserFeed, CoreError> {
        let limit = self.effective_limit(request.limit);

        let mut args = BTreeMap::new();
        args.insert(String::from("username"), json!(request.username.as_str()));
        args.insert(
            String::from("content_type"),
            json!(request.content_type.as_str()),
        );
        args.insert(String::from("sort"), json!(request.sort.as_str()));
        args.insert(
            String::from("time_filter"),
            json!(request.time_filter.map(TimeFilter::as_str)),
        );
        args.insert(String::from("limit"), json!(limit));
        args.insert(String::from("after"), json!(request.after));
        let key = cache_key("user_feed", &args);

        let value = self
            .fetcher
            .fetch(&key, None, || async {
                let payload = self
                    .client
                    .user_listing(
                        &request.username,
                        request.content_type,
                        request.sort,
                        request.time_filter,
                        limit,
                        request.after.as_deref(),
                    )
                    .await?;

                let posts = listing::posts_from_listing(&payload);
                let comments = listing::comments_from_listing(&payload);
                to_cache_value(&UserFeed {
                    username: request.username.as_str().to_string(),
                    content_type: request.content_type,
                    sort: request.sort,
                    post_count: posts.len(),
                    comment_count: comments.len(),
                    posts,
                    comments,
                    cursors: PageCursors::from_listing(&payload),
                })
            })
            .await?;

        from_cache_value(value)
    }

    /// Search posts site-wide or within one subreddit.
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResults, CoreError> {
        let query_text = request.query.trim();
        if query_text.is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }
        let limit = self.effective_limit(request.limit);
        let subreddit_arg = request.subreddit.as_ref().map(SubredditName::as_str);

        let mut args = BTreeMap::new();
        args.insert(String::from("query"), json!(query_text));
        args.insert(String::from("subreddit"), json!(subreddit_arg));
        args.insert(String::from("sort"), json!(request.sort.as_str()));
        args.insert(
            String::from("time_filter"),
            json!(request.time_filter.map(TimeFilter::as_str)),
        );
        args.insert(String::from("limit"), json!(limit));
        args.insert(String::from("after"), json!(request.after));
        let key = cache_key("search", &args);

        let value = self
            .fetcher
            .fetch(&key, None, || async {
                let payload = self
                    .client
                    .search(
                        query_text,
                        request.subreddit.as_ref(),
                        request.sort,
                        request.time_filter,
                        limit,
                        request.after.as_deref(),
                        None,
                    )
                    .await?;

                let posts = listing::posts_from_listing(&payload);
                to_cache_value(&SearchResults {
                    query: query_text.to_string(),
                    subreddit: subreddit_arg.map(str::to_string),
                    sort: request.sort,
                    result_count: posts.len(),
                    posts,
                    cursors: PageCursors::from_listing(&payload),
                })
            })
            .await?;

        from_cache_value(value)
    }

    /// A post's comment tree, with replies parsed to the requested depth.
    pub async fn post_comments(
        &self,
        request: &PostCommentsRequest,
    ) -> Result<PostComments, CoreError> {
        let post_id = request.post_id.trim();
        let post_id = post_id.strip_prefix("t3_").unwrap_or(post_id);
        if post_id.is_empty() {
            return Err(ValidationError::EmptyPostId.into());
        }
        let limit = request
            .limit
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_COMMENT_LIMIT)
            .min(MAX_COMMENT_LIMIT);
        let depth = request.depth.unwrap_or(DEFAULT_REPLY_DEPTH).min(MAX_REPLY_DEPTH);
        let subreddit_arg = request.subreddit.as_ref().map(SubredditName::as_str);

        let mut args = BTreeMap::new();
        args.insert(String::from("post_id"), json!(post_id));
        args.insert(String::from("subreddit"), json!(subreddit_arg));
        args.insert(String::from("sort"), json!(request.sort.as_str()));
        args.insert(String::from("limit"), json!(limit));
        args.insert(String::from("depth"), json!(depth));
        let key = cache_key("post_comments", &args);

        let value = self
            .fetcher
            .fetch(&key, None, || async {
                let payload = self
                    .client
                    .post_comments(
                        post_id,
                        request.subreddit.as_ref(),
                        request.sort,
                        limit,
                        Some(depth),
                    )
                    .await?;

                // First array element is the post's own listing.
                let post = payload
                    .get(0)
                    .map(listing::posts_from_listing)
                    .and_then(|posts| posts.into_iter().next());
                let comments = listing::comment_tree(&payload, depth);

                to_cache_value(&PostComments {
                    post_id: format!("t3_{post_id}"),
                    sort: request.sort,
                    depth,
                    comment_count: comments.len(),
                    post,
                    comments,
                })
            })
            .await?;

        from_cache_value(value)
    }

    /// Subreddit profile from `about.json`.
    pub async fn subreddit_about(
        &self,
        subreddit: &SubredditName,
    ) -> Result<SubredditInfo, CoreError> {
        let mut args = BTreeMap::new();
        args.insert(String::from("subreddit"), json!(subreddit.as_str()));
        let key = cache_key("subreddit_about", &args);

        let value = self
            .fetcher
            .fetch(&key, None, || async {
                let payload = self.client.subreddit_about(subreddit).await?;
                let raw = payload
                    .get("data")
                    .and_then(Value::as_object)
                    .ok_or_else(|| {
                        FetchError::parse("subreddit about payload is missing its data object")
                    })?;
                to_cache_value(&SubredditInfo::from_raw(raw)?)
            })
            .await?;

        from_cache_value(value)
    }

    fn effective_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .filter(|limit| *limit > 0)
            .unwrap_or(self.config.reddit.default_limit)
            .min(self.config.reddit.max_items_per_request)
    }
}

fn to_cache_value<T: Serialize>(value: &T) -> Result<Value, FetchError> {
    serde_json::to_value(value)
        .map_err(|error| FetchError::parse(format!("failed to encode cached result: {error}")))
}

fn from_cache_value<T: DeserializeOwned>(value: Value) -> Result<T, CoreError> {
    serde_json::from_value(value).map_err(CoreError::from)
}
