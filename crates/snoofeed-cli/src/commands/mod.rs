mod about;
mod comments;
mod feed;
mod search;
mod user;

use serde_json::Value;
use snoofeed_core::RedditService;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Dispatch the parsed command against the shared service instance.
pub async fn run(cli: &Cli, service: &RedditService) -> Result<Value, CliError> {
    match &cli.command {
        Command::Feed {
            subreddit,
            sort,
            time_filter,
            limit,
            after,
            before,
        } => {
            feed::run(
                service,
                subreddit.as_deref(),
                sort,
                time_filter.as_deref(),
                *limit,
                after.as_deref(),
                before.as_deref(),
            )
            .await
        }
        Command::User {
            username,
            content_type,
            sort,
            time_filter,
            limit,
            after,
        } => {
            user::run(
                service,
                username,
                content_type,
                sort,
                time_filter.as_deref(),
                *limit,
                after.as_deref(),
            )
            .await
        }
        Command::Search {
            query,
            subreddit,
            sort,
            time_filter,
            limit,
            after,
        } => {
            search::run(
                service,
                query,
                subreddit.as_deref(),
                sort,
                time_filter.as_deref(),
                *limit,
                after.as_deref(),
            )
            .await
        }
        Command::Comments {
            post_id,
            subreddit,
            sort,
            limit,
            depth,
        } => comments::run(service, post_id, subreddit.as_deref(), sort, *limit, *depth).await,
        Command::About { subreddit } => about::run(service, subreddit).await,
        Command::CacheStats => Ok(serde_json::to_value(service.cache_stats().await)?),
    }
}
