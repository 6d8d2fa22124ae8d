//! Sort orders and range filters accepted by the Reddit listing endpoints.
//!
//! Each endpoint accepts its own sort vocabulary, so the sorts are distinct
//! types rather than one shared enum; mixing them up is a compile error.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Sort order for subreddit and frontpage feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSort {
    #[default]
    Hot,
    New,
    Top,
    Rising,
    Controversial,
}

impl FeedSort {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::New => "new",
            Self::Top => "top",
            Self::Rising => "rising",
            Self::Controversial => "controversial",
        }
    }

    /// Whether the `t` time-range parameter applies to this sort.
    pub const fn supports_time_filter(self) -> bool {
        matches!(self, Self::Top | Self::Controversial)
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "hot" => Ok(Self::Hot),
            "new" => Ok(Self::New),
            "top" => Ok(Self::Top),
            "rising" => Ok(Self::Rising),
            "controversial" => Ok(Self::Controversial),
            other => Err(ValidationError::InvalidFeedSort {
                value: other.to_string(),
            }),
        }
    }
}

impl Display for FeedSort {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort order for user overview/submitted/comment listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSort {
    #[default]
    New,
    Top,
    Controversial,
}

impl UserSort {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Top => "top",
            Self::Controversial => "controversial",
        }
    }

    pub const fn supports_time_filter(self) -> bool {
        matches!(self, Self::Top | Self::Controversial)
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "top" => Ok(Self::Top),
            "controversial" => Ok(Self::Controversial),
            other => Err(ValidationError::InvalidUserSort {
                value: other.to_string(),
            }),
        }
    }
}

impl Display for UserSort {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort order for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSort {
    #[default]
    Relevance,
    Hot,
    Top,
    New,
    Comments,
}

impl SearchSort {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Hot => "hot",
            Self::Top => "top",
            Self::New => "new",
            Self::Comments => "comments",
        }
    }

    pub const fn supports_time_filter(self) -> bool {
        matches!(self, Self::Top | Self::Comments)
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "relevance" => Ok(Self::Relevance),
            "hot" => Ok(Self::Hot),
            "top" => Ok(Self::Top),
            "new" => Ok(Self::New),
            "comments" => Ok(Self::Comments),
            other => Err(ValidationError::InvalidSearchSort {
                value: other.to_string(),
            }),
        }
    }
}

impl Display for SearchSort {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort order for a post's comment tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentSort {
    #[default]
    Best,
    Top,
    New,
    Controversial,
    Old,
    Qa,
}

impl CommentSort {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Best => "best",
            Self::Top => "top",
            Self::New => "new",
            Self::Controversial => "controversial",
            Self::Old => "old",
            Self::Qa => "qa",
        }
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "best" => Ok(Self::Best),
            "top" => Ok(Self::Top),
            "new" => Ok(Self::New),
            "controversial" => Ok(Self::Controversial),
            "old" => Ok(Self::Old),
            "qa" => Ok(Self::Qa),
            other => Err(ValidationError::InvalidCommentSort {
                value: other.to_string(),
            }),
        }
    }
}

impl Display for CommentSort {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Time range applied to `top`/`controversial`-style sorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFilter {
    Hour,
    Day,
    Week,
    Month,
    Year,
    All,
}

impl TimeFilter {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::All => "all",
        }
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            "all" => Ok(Self::All),
            other => Err(ValidationError::InvalidTimeFilter {
                value: other.to_string(),
            }),
        }
    }
}

impl Display for TimeFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of a user's history to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Posts,
    Comments,
    #[default]
    All,
}

impl ContentType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Comments => "comments",
            Self::All => "all",
        }
    }

    /// Path segment selecting this content type under `/user/{name}`.
    pub const fn path_segment(self) -> Option<&'static str> {
        match self {
            Self::Posts => Some("submitted"),
            Self::Comments => Some("comments"),
            Self::All => None,
        }
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "posts" => Ok(Self::Posts),
            "comments" => Ok(Self::Comments),
            "all" => Ok(Self::All),
            other => Err(ValidationError::InvalidContentType {
                value: other.to_string(),
            }),
        }
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
