use serde_json::Value;
use snoofeed_core::{CommentSort, PostCommentsRequest, RedditService, SubredditName};

use crate::error::CliError;

pub async fn run(
    service: &RedditService,
    post_id: &str,
    subreddit: Option<&str>,
    sort: &str,
    limit: Option<u32>,
    depth: Option<u32>,
) -> Result<Value, CliError> {
    let mut request = PostCommentsRequest::new(post_id).with_sort(CommentSort::parse(sort)?);
    if let Some(name) = subreddit {
        request = request.in_subreddit(SubredditName::parse(name)?);
    }
    if let Some(limit) = limit {
        request = request.with_limit(limit);
    }
    if let Some(depth) = depth {
        request = request.with_depth(depth);
    }

    let comments = service.post_comments(&request).await?;
    Ok(serde_json::to_value(comments)?)
}
