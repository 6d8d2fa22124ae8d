//! Typed Reddit records built from raw, loosely-typed payload maps.
//!
//! Construction is total: every optional field degrades to a documented
//! default when missing or malformed. Only the identifying fullname (`name`)
//! is structurally required; a record without one yields a parse error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::domain::coerce;
use crate::domain::listing;
use crate::error::FetchError;

/// Raw field map as decoded from a listing child's `data` object.
pub type RawMap = serde_json::Map<String, Value>;

/// Post or comment author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub username: String,
    pub id: String,
}

impl Author {
    pub fn from_raw(raw: &RawMap) -> Self {
        Self {
            username: coerce::string_or_default(raw.get("author")),
            id: coerce::string_or_default(raw.get("author_fullname")),
        }
    }
}

/// Subreddit a post or comment belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubredditRef {
    pub name: String,
    pub id: String,
    pub subscribers: Option<u64>,
}

impl SubredditRef {
    pub fn from_raw(raw: &RawMap) -> Self {
        Self {
            name: coerce::string_or_default(raw.get("subreddit")),
            id: coerce::string_or_default(raw.get("subreddit_id")),
            subscribers: coerce::coerce_uint(raw.get("subreddit_subscribers")),
        }
    }
}

/// Vote and engagement counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub score: i64,
    pub upvotes: i64,
    pub downvotes: i64,
    pub upvote_ratio: Option<f64>,
    pub comments: Option<u64>,
    pub crossposts: Option<u64>,
    pub awards: Option<u64>,
}

impl Stats {
    pub fn from_post_raw(raw: &RawMap) -> Self {
        Self {
            score: coerce::coerce_int(raw.get("score")).unwrap_or(0),
            upvotes: coerce::coerce_int(raw.get("ups")).unwrap_or(0),
            downvotes: coerce::coerce_int(raw.get("downs")).unwrap_or(0),
            upvote_ratio: coerce::coerce_float(raw.get("upvote_ratio")),
            comments: coerce::coerce_uint(raw.get("num_comments")),
            crossposts: coerce::coerce_uint(raw.get("num_crossposts")),
            awards: coerce::coerce_uint(raw.get("total_awards_received")),
        }
    }

    /// Comment payloads carry no ratio or crosspost counters.
    pub fn from_comment_raw(raw: &RawMap) -> Self {
        Self {
            upvote_ratio: None,
            comments: None,
            crossposts: None,
            ..Self::from_post_raw(raw)
        }
    }
}

/// Lifecycle flags and timestamps shared by posts and comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub created_utc: f64,
    /// RFC 3339 rendering of `created_utc`, when the source supplied one.
    pub created_at: Option<String>,
    pub edited: bool,
    pub stickied: bool,
    pub locked: bool,
    pub archived: bool,
    pub quarantine: bool,
    /// Post-only flags; `None` on comments.
    pub is_video: Option<bool>,
    pub is_self: Option<bool>,
    pub over_18: Option<bool>,
    pub spoiler: Option<bool>,
    pub hidden: Option<bool>,
    pub pinned: Option<bool>,
}

impl Metadata {
    pub fn from_post_raw(raw: &RawMap) -> Self {
        Self {
            is_video: coerce::coerce_bool(raw.get("is_video")),
            is_self: coerce::coerce_bool(raw.get("is_self")),
            over_18: coerce::coerce_bool(raw.get("over_18")),
            spoiler: coerce::coerce_bool(raw.get("spoiler")),
            hidden: coerce::coerce_bool(raw.get("hidden")),
            pinned: coerce::coerce_bool(raw.get("pinned")),
            ..Self::from_comment_raw(raw)
        }
    }

    pub fn from_comment_raw(raw: &RawMap) -> Self {
        let created_utc = coerce::coerce_float(raw.get("created_utc")).unwrap_or(0.0);
        Self {
            created_utc,
            created_at: render_epoch(created_utc),
            edited: coerce::coerce_bool(raw.get("edited")).unwrap_or(false),
            stickied: coerce::coerce_bool(raw.get("stickied")).unwrap_or(false),
            locked: coerce::coerce_bool(raw.get("locked")).unwrap_or(false),
            archived: coerce::coerce_bool(raw.get("archived")).unwrap_or(false),
            quarantine: coerce::coerce_bool(raw.get("quarantine")).unwrap_or(false),
            is_video: None,
            is_self: None,
            over_18: None,
            spoiler: None,
            hidden: None,
            pinned: None,
        }
    }
}

fn render_epoch(created_utc: f64) -> Option<String> {
    if created_utc <= 0.0 {
        return None;
    }
    OffsetDateTime::from_unix_timestamp(created_utc as i64)
        .ok()
        .and_then(|ts| ts.format(&Rfc3339).ok())
}

/// Thumbnail placeholder sentinels Reddit sends instead of a URL.
const THUMBNAIL_SENTINELS: [&str; 4] = ["self", "default", "nsfw", "spoiler"];

/// A submission, self-post or link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub description: String,
    pub link: String,
    pub author: Author,
    pub subreddit: SubredditRef,
    pub stats: Stats,
    pub metadata: Metadata,
    pub domain: Option<String>,
    pub flair_text: Option<String>,
    pub thumbnail: Option<String>,
}

impl Post {
    /// Build a post from a raw field map. Only a missing fullname id fails;
    /// every other gap takes its documented default.
    pub fn from_raw(raw: &RawMap) -> Result<Self, FetchError> {
        let id = coerce::string_or_default(raw.get("name"));
        if id.is_empty() {
            return Err(FetchError::parse("post payload is missing its fullname id"));
        }

        Ok(Self {
            id,
            title: coerce::string_or_default(raw.get("title")),
            description: coerce::string_or_default(raw.get("selftext")),
            link: coerce::string_or_default(raw.get("url")),
            author: Author::from_raw(raw),
            subreddit: SubredditRef::from_raw(raw),
            stats: Stats::from_post_raw(raw),
            metadata: Metadata::from_post_raw(raw),
            domain: coerce::opt_string(raw.get("domain")),
            flair_text: coerce::opt_string(raw.get("link_flair_text")),
            thumbnail: coerce::opt_string(raw.get("thumbnail"))
                .filter(|value| !value.is_empty())
                .filter(|value| !THUMBNAIL_SENTINELS.contains(&value.as_str())),
        })
    }
}

/// The post a comment hangs off, as carried in comment payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRef {
    pub id: String,
    pub title: String,
    pub link: String,
}

impl PostRef {
    pub fn from_raw(raw: &RawMap) -> Self {
        Self {
            id: coerce::string_or_default(raw.get("link_id")),
            title: coerce::string_or_default(raw.get("link_title")),
            link: coerce::string_or_default(raw.get("link_permalink")),
        }
    }
}

/// A comment, with replies parsed to a bounded depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub body: String,
    pub body_html: Option<String>,
    pub author: Author,
    pub post: PostRef,
    pub subreddit: SubredditRef,
    pub stats: Stats,
    pub metadata: Metadata,
    pub parent_id: Option<String>,
    pub replies: Vec<Comment>,
}

impl Comment {
    /// Build a comment from a raw field map, descending into nested replies
    /// while `depth_remaining > 0`. At depth 0 `replies` is always empty no
    /// matter what the payload carries; reply depth is service-controlled,
    /// so the truncation must not depend on payload shape.
    pub fn from_raw(raw: &RawMap, depth_remaining: u32) -> Result<Self, FetchError> {
        let id = coerce::string_or_default(raw.get("name"));
        if id.is_empty() {
            return Err(FetchError::parse("comment payload is missing its fullname id"));
        }

        Ok(Self {
            id,
            body: coerce::string_or_default(raw.get("body")),
            body_html: coerce::opt_string(raw.get("body_html")),
            author: Author::from_raw(raw),
            post: PostRef::from_raw(raw),
            subreddit: SubredditRef::from_raw(raw),
            stats: Stats::from_comment_raw(raw),
            metadata: Metadata::from_comment_raw(raw),
            parent_id: coerce::opt_string(raw.get("parent_id")),
            replies: Self::parse_replies(raw.get("replies"), depth_remaining),
        })
    }

    // Reddit encodes "no replies" as the empty string rather than an empty
    // listing, and individual malformed children are skipped, not fatal.
    fn parse_replies(raw: Option<&Value>, depth_remaining: u32) -> Vec<Comment> {
        if depth_remaining == 0 {
            return Vec::new();
        }
        let Some(payload @ Value::Object(_)) = raw else {
            return Vec::new();
        };

        listing::listing_children(payload)
            .iter()
            .filter(|child| child.get("kind").and_then(Value::as_str) == Some("t1"))
            .filter_map(|child| child.get("data").and_then(Value::as_object))
            .filter_map(|data| Comment::from_raw(data, depth_remaining - 1).ok())
            .collect()
    }
}

/// Subreddit profile from the `about.json` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubredditInfo {
    pub name: String,
    pub title: String,
    pub description: String,
    pub subscribers: Option<u64>,
    pub active_users: Option<u64>,
    pub created_utc: f64,
    pub over_18: Option<bool>,
    pub url: String,
}

impl SubredditInfo {
    pub fn from_raw(raw: &RawMap) -> Result<Self, FetchError> {
        let name = coerce::string_or_default(raw.get("display_name"));
        if name.is_empty() {
            return Err(FetchError::parse(
                "subreddit about payload is missing its display name",
            ));
        }

        Ok(Self {
            name,
            title: coerce::string_or_default(raw.get("title")),
            description: coerce::string_or_default(raw.get("public_description")),
            subscribers: coerce::coerce_uint(raw.get("subscribers")),
            active_users: coerce::coerce_uint(raw.get("active_user_count")),
            created_utc: coerce::coerce_float(raw.get("created_utc")).unwrap_or(0.0),
            over_18: coerce::coerce_bool(raw.get("over18")),
            url: coerce::string_or_default(raw.get("url")),
        })
    }
}
