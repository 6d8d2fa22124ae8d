//! # Domain Models
//!
//! Typed records and vocabulary for the Reddit JSON API.
//!
//! ## Overview
//!
//! Reddit's payloads are loosely typed: counters arrive as native numbers or
//! decimal-formatted strings, flags double as timestamps, and whole subtrees
//! go missing. This module turns that into records a caller can rely on:
//!
//! - **Tolerant coercion** ([`coerce`]) answers `None` for anything
//!   unparseable instead of failing.
//! - **Total constructors** ([`models`]) default every optional field and
//!   fail only when the identifying fullname is absent.
//! - **Validated names** ([`names`]) reject malformed subreddit/user names
//!   before any network activity.
//! - **Listing traversal** ([`listing`]) walks listing envelopes and the
//!   depth-bounded comment tree.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Post`] | Submission with author/subreddit/stats/metadata groupings |
//! | [`Comment`] | Comment with depth-bounded recursive replies |
//! | [`SubredditInfo`] | Profile from the `about.json` endpoint |
//! | [`SubredditName`], [`Username`] | Validated name newtypes |
//! | [`FeedSort`], [`TimeFilter`], … | Endpoint sort/filter vocabulary |
//! | [`PageCursors`] | Opaque pagination cursors |

pub mod coerce;
mod filters;
pub mod listing;
mod models;
mod names;

pub use filters::{CommentSort, ContentType, FeedSort, SearchSort, TimeFilter, UserSort};
pub use listing::PageCursors;
pub use models::{
    Author, Comment, Metadata, Post, PostRef, RawMap, Stats, SubredditInfo, SubredditRef,
};
pub use names::{SubredditName, Username};
