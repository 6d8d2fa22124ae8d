//! Resilient client for the public Reddit JSON endpoints.
//!
//! Every call runs the same discipline: wait for rate-limiter admission,
//! send with a bounded timeout, feed rate-limit headers back to the limiter,
//! classify the outcome, and retry transient failures with exponential
//! backoff. Admission waits suspend only the calling task.
//!
//! Retry policy: timeouts, connection faults, 5xx, and 429 are transient and
//! retried up to the configured limit, with a parseable `retry-after` header
//! taking precedence over computed backoff. 403, 404, and malformed requests
//! fail immediately with their typed error.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::config::{BackoffPolicy, Config};
use crate::domain::coerce;
use crate::domain::{CommentSort, ContentType, FeedSort, SearchSort, SubredditName, TimeFilter, UserSort, Username};
use crate::error::FetchError;
use crate::http::{HttpClient, HttpError, HttpRequest, HttpResponse};
use crate::rate_limit::RateLimiter;

/// HTTP client for Reddit with retry and rate limiting.
#[derive(Clone)]
pub struct RedditClient {
    http: Arc<dyn HttpClient>,
    rate_limiter: Arc<RateLimiter>,
    backoff: BackoffPolicy,
    base_url: String,
    timeout: Duration,
}

impl RedditClient {
    pub fn new(http: Arc<dyn HttpClient>, rate_limiter: Arc<RateLimiter>, config: &Config) -> Self {
        Self {
            http,
            rate_limiter,
            backoff: config.request.backoff.clone(),
            base_url: config.reddit.base_url.trim_end_matches('/').to_string(),
            timeout: config.request.timeout,
        }
    }

    /// Fetch a JSON document, retrying transient failures.
    pub async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let url = self.request_url(path, query);
        let mut attempt: u32 = 0;

        loop {
            // Flow control, not an error path: suspend until admitted.
            self.rate_limiter.acquire().await;

            let request = HttpRequest::get(url.clone()).with_timeout(self.timeout);
            let outcome = match self.http.execute(request).await {
                Ok(response) => {
                    self.rate_limiter.on_response_headers(&response.headers);
                    classify(response, &url)
                }
                Err(error) => Err(transport_error(error)),
            };

            let error = match outcome {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !error.retryable() || attempt >= self.backoff.max_retries {
                return Err(error);
            }

            let delay = error
                .retry_after()
                .unwrap_or_else(|| self.backoff.delay(attempt));
            tracing::warn!(
                url = url.as_str(),
                attempt = attempt + 1,
                delay_secs = delay.as_secs_f64(),
                error = %error,
                "transient failure, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Posts from a subreddit, or the frontpage when `subreddit` is `None`.
    pub async fn subreddit_listing(
        &self,
        subreddit: Option<&SubredditName>,
        sort: FeedSort,
        time_filter: Option<TimeFilter>,
        limit: u32,
        after: Option<&str>,
        before: Option<&str>,
    ) -> Result<Value, FetchError> {
        let path = match subreddit {
            Some(name) => format!("/r/{name}/{sort}"),
            None => format!("/{sort}"),
        };

        let mut query = vec![("limit", limit.to_string())];
        push_time_filter(&mut query, sort.supports_time_filter(), time_filter);
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }
        if let Some(before) = before {
            query.push(("before", before.to_string()));
        }

        self.get_json(&path, &query).await
    }

    /// Subreddit profile from `about.json`.
    pub async fn subreddit_about(&self, subreddit: &SubredditName) -> Result<Value, FetchError> {
        self.get_json(&format!("/r/{subreddit}/about"), &[]).await
    }

    /// A user's posts and/or comments.
    pub async fn user_listing(
        &self,
        username: &Username,
        content_type: ContentType,
        sort: UserSort,
        time_filter: Option<TimeFilter>,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Value, FetchError> {
        let mut path = format!("/user/{username}");
        if let Some(segment) = content_type.path_segment() {
            path.push('/');
            path.push_str(segment);
        }
        path.push('/');
        path.push_str(sort.as_str());

        let mut query = vec![("limit", limit.to_string())];
        push_time_filter(&mut query, sort.supports_time_filter(), time_filter);
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }

        self.get_json(&path, &query).await
    }

    /// Search site-wide, or within one subreddit when `subreddit` is given.
    pub async fn search(
        &self,
        query_text: &str,
        subreddit: Option<&SubredditName>,
        sort: SearchSort,
        time_filter: Option<TimeFilter>,
        limit: u32,
        after: Option<&str>,
        type_filter: Option<&str>,
    ) -> Result<Value, FetchError> {
        let (path, mut query) = match subreddit {
            Some(name) => (
                format!("/r/{name}/search"),
                vec![
                    ("q", query_text.to_string()),
                    ("restrict_sr", String::from("true")),
                ],
            ),
            None => (String::from("/search"), vec![("q", query_text.to_string())]),
        };

        query.push(("sort", sort.to_string()));
        query.push(("limit", limit.to_string()));
        push_time_filter(&mut query, sort.supports_time_filter(), time_filter);
        if let Some(after) = after {
            query.push(("after", after.to_string()));
        }
        if let Some(type_filter) = type_filter {
            query.push(("type", type_filter.to_string()));
        }

        self.get_json(&path, &query).await
    }

    /// A post's comment page: the two-element `[post, comments]` payload.
    pub async fn post_comments(
        &self,
        post_id: &str,
        subreddit: Option<&SubredditName>,
        sort: CommentSort,
        limit: u32,
        depth: Option<u32>,
    ) -> Result<Value, FetchError> {
        let id = post_id.strip_prefix("t3_").unwrap_or(post_id);
        let path = match subreddit {
            Some(name) => format!("/r/{name}/comments/{id}"),
            None => format!("/comments/{id}"),
        };

        let mut query = vec![("sort", sort.to_string()), ("limit", limit.to_string())];
        if let Some(depth) = depth {
            query.push(("depth", depth.to_string()));
        }

        self.get_json(&path, &query).await
    }

    // Reddit serves JSON from any HTML path suffixed with `.json`.
    fn request_url(&self, path: &str, query: &[(&str, String)]) -> String {
        let mut url = format!("{}{}", self.base_url, path);
        if !url.ends_with(".json") {
            url.push_str(".json");
        }
        if !query.is_empty() {
            let encoded: Vec<String> = query
                .iter()
                .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
                .collect();
            url.push('?');
            url.push_str(&encoded.join("&"));
        }
        url
    }
}

fn push_time_filter(
    query: &mut Vec<(&str, String)>,
    supported: bool,
    time_filter: Option<TimeFilter>,
) {
    if supported {
        if let Some(filter) = time_filter {
            query.push(("t", filter.to_string()));
        }
    }
}

fn classify(response: HttpResponse, url: &str) -> Result<Value, FetchError> {
    if response.is_success() {
        return serde_json::from_str(&response.body)
            .map_err(|error| FetchError::parse(format!("response body is not valid JSON: {error}")));
    }

    match response.status {
        404 => Err(FetchError::not_found(format!("resource not found: {url}"))),
        403 => Err(FetchError::forbidden(format!("access forbidden: {url}"))),
        429 => {
            let retry_after = response
                .header("retry-after")
                .and_then(coerce::numeric_str)
                .filter(|secs| *secs > 0.0)
                .map(Duration::from_secs_f64);
            Err(FetchError::rate_limited(
                format!("rate limited by upstream: {url}"),
                retry_after,
            ))
        }
        status => Err(FetchError::upstream_status(
            status,
            format!("upstream returned status {status} for {url}"),
        )),
    }
}

fn transport_error(error: HttpError) -> FetchError {
    if error.retryable() {
        FetchError::network(error.message().to_string())
    } else {
        FetchError::network_fatal(error.message().to_string())
    }
}
