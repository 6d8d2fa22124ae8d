//! CLI argument definitions for snoofeed.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `feed` | Posts from a subreddit, or the frontpage |
//! | `user` | A user's posts and comments |
//! | `search` | Search posts site-wide or within a subreddit |
//! | `comments` | A post's comment tree |
//! | `about` | Subreddit profile |
//! | `cache-stats` | Cache hit/miss/eviction counters |
//!
//! Configuration (cache TTL, rate limits, timeouts) comes from `SNOOFEED_*`
//! environment variables, not flags; see `snoofeed_core::Config::from_env`.

use clap::{Parser, Subcommand};

/// Cached, rate-limited Reddit feed fetcher.
///
/// Fetches public Reddit JSON endpoints with result caching, token-bucket
/// rate limiting, and automatic retry of transient failures.
#[derive(Debug, Parser)]
#[command(name = "snoofeed", author, version, about = "Cached, rate-limited Reddit feed fetcher")]
pub struct Cli {
    /// Pretty-print JSON output.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Posts from a subreddit, or the frontpage when no subreddit is given.
    Feed {
        /// Subreddit name, with or without the r/ prefix.
        subreddit: Option<String>,

        /// Sort order: hot, new, top, rising, controversial.
        #[arg(long, default_value = "hot")]
        sort: String,

        /// Time range for top/controversial: hour, day, week, month, year, all.
        #[arg(long = "time")]
        time_filter: Option<String>,

        /// Number of posts to fetch.
        #[arg(long)]
        limit: Option<u32>,

        /// Pagination cursor for the next page.
        #[arg(long)]
        after: Option<String>,

        /// Pagination cursor for the previous page.
        #[arg(long)]
        before: Option<String>,
    },

    /// A user's posts and comments.
    User {
        /// Username, with or without the u/ prefix.
        username: String,

        /// Content to fetch: posts, comments, all.
        #[arg(long = "content", default_value = "all")]
        content_type: String,

        /// Sort order: new, top, controversial.
        #[arg(long, default_value = "new")]
        sort: String,

        /// Time range for top/controversial.
        #[arg(long = "time")]
        time_filter: Option<String>,

        /// Number of items to fetch.
        #[arg(long)]
        limit: Option<u32>,

        /// Pagination cursor for the next page.
        #[arg(long)]
        after: Option<String>,
    },

    /// Search posts site-wide or within one subreddit.
    Search {
        /// Search query.
        query: String,

        /// Restrict the search to this subreddit.
        #[arg(long)]
        subreddit: Option<String>,

        /// Sort order: relevance, hot, top, new, comments.
        #[arg(long, default_value = "relevance")]
        sort: String,

        /// Time range for top/comments sorts.
        #[arg(long = "time")]
        time_filter: Option<String>,

        /// Number of results to fetch.
        #[arg(long)]
        limit: Option<u32>,

        /// Pagination cursor for the next page.
        #[arg(long)]
        after: Option<String>,
    },

    /// A post's comment tree with nested replies.
    Comments {
        /// Post id, with or without the t3_ prefix.
        post_id: String,

        /// Subreddit the post lives in (optional, shortens the lookup).
        #[arg(long)]
        subreddit: Option<String>,

        /// Sort order: best, top, new, controversial, old, qa.
        #[arg(long, default_value = "best")]
        sort: String,

        /// Maximum number of comments to fetch.
        #[arg(long)]
        limit: Option<u32>,

        /// Reply depth to descend to (0 = top-level only).
        #[arg(long)]
        depth: Option<u32>,
    },

    /// Subreddit profile from about.json.
    About {
        /// Subreddit name, with or without the r/ prefix.
        subreddit: String,
    },

    /// Cache hit/miss/eviction counters for this process.
    CacheStats,
}
