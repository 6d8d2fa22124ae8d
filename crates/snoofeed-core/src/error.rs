use std::fmt::{Display, Formatter};
use std::time::Duration;

use thiserror::Error;

/// Caller-argument validation errors raised before any network activity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid subreddit name '{value}': must be 2-21 characters, alphanumeric and underscores only")]
    InvalidSubredditName { value: String },
    #[error("invalid username '{value}': must be 3-20 characters, alphanumeric, underscores and hyphens only")]
    InvalidUsername { value: String },
    #[error("search query cannot be empty")]
    EmptyQuery,
    #[error("post id cannot be empty")]
    EmptyPostId,

    #[error("invalid feed sort '{value}', expected one of hot, new, top, rising, controversial")]
    InvalidFeedSort { value: String },
    #[error("invalid user sort '{value}', expected one of new, top, controversial")]
    InvalidUserSort { value: String },
    #[error("invalid search sort '{value}', expected one of relevance, hot, top, new, comments")]
    InvalidSearchSort { value: String },
    #[error("invalid comment sort '{value}', expected one of best, top, new, controversial, old, qa")]
    InvalidCommentSort { value: String },
    #[error("invalid time filter '{value}', expected one of hour, day, week, month, year, all")]
    InvalidTimeFilter { value: String },
    #[error("invalid content type '{value}', expected one of posts, comments, all")]
    InvalidContentType { value: String },
}

/// Failure classification for remote fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Target resource does not exist upstream (404).
    NotFound,
    /// Access denied, e.g. a private or quarantined subreddit (403).
    Forbidden,
    /// Upstream throttling persisted through every retry (429).
    RateLimited,
    /// Timeout, connection failure, or server error after retries.
    Network,
    /// A structurally required field could not be resolved, or a
    /// response body was not valid JSON.
    Parse,
}

/// Structured fetch error carried across the core boundary.
///
/// Internal status codes stay available for diagnostic logging via
/// [`FetchError::status`], but callers are expected to branch on
/// [`FetchError::kind`] only.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
    status: Option<u16>,
    retry_after: Option<Duration>,
    retryable: bool,
}

impl FetchError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::NotFound,
            message: message.into(),
            status: Some(404),
            retry_after: None,
            retryable: false,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Forbidden,
            message: message.into(),
            status: Some(403),
            retry_after: None,
            retryable: false,
        }
    }

    pub fn rate_limited(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self {
            kind: FetchErrorKind::RateLimited,
            message: message.into(),
            status: Some(429),
            retry_after,
            retryable: true,
        }
    }

    /// Transport-level fault (timeout, connection reset) worth retrying.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Network,
            message: message.into(),
            status: None,
            retry_after: None,
            retryable: true,
        }
    }

    /// Transport-level fault that retrying cannot fix, e.g. a request the
    /// client itself built wrong.
    pub fn network_fatal(message: impl Into<String>) -> Self {
        Self {
            retryable: false,
            ..Self::network(message)
        }
    }

    /// Non-2xx status with no more specific classification. Server errors
    /// are retryable, other statuses are not.
    pub fn upstream_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Network,
            message: message.into(),
            status: Some(status),
            retry_after: None,
            retryable: status >= 500,
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: FetchErrorKind::Parse,
            message: message.into(),
            status: None,
            retry_after: None,
            retryable: false,
        }
    }

    pub const fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Last observed HTTP status, when one was observed.
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// Upstream-reported wait hint, when the service supplied one.
    pub const fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FetchErrorKind::NotFound => "reddit.not_found",
            FetchErrorKind::Forbidden => "reddit.forbidden",
            FetchErrorKind::RateLimited => "reddit.rate_limited",
            FetchErrorKind::Network => "reddit.network",
            FetchErrorKind::Parse => "reddit.parse",
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for FetchError {}

/// Top-level error type for service operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_are_not_retryable() {
        assert!(!FetchError::not_found("gone").retryable());
        assert!(!FetchError::forbidden("private").retryable());
        assert!(!FetchError::parse("missing id").retryable());
    }

    #[test]
    fn transient_failures_are_retryable() {
        assert!(FetchError::network("timed out").retryable());
        assert!(FetchError::rate_limited("slow down", None).retryable());
        assert!(FetchError::upstream_status(503, "unavailable").retryable());
    }

    #[test]
    fn unexpected_client_statuses_are_terminal() {
        let error = FetchError::upstream_status(400, "bad request");
        assert!(!error.retryable());
        assert_eq!(error.status(), Some(400));
    }

    #[test]
    fn rate_limited_keeps_the_upstream_wait_hint() {
        let error = FetchError::rate_limited("throttled", Some(Duration::from_secs(42)));
        assert_eq!(error.retry_after(), Some(Duration::from_secs(42)));
        assert_eq!(error.code(), "reddit.rate_limited");
    }
}
