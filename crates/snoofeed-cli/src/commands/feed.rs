use serde_json::Value;
use snoofeed_core::{
    FeedSort, RedditService, SubredditFeedRequest, SubredditName, TimeFilter,
};

use crate::error::CliError;

pub async fn run(
    service: &RedditService,
    subreddit: Option<&str>,
    sort: &str,
    time_filter: Option<&str>,
    limit: Option<u32>,
    after: Option<&str>,
    before: Option<&str>,
) -> Result<Value, CliError> {
    let mut request = match subreddit {
        Some(name) => SubredditFeedRequest::new(SubredditName::parse(name)?),
        None => SubredditFeedRequest::frontpage(),
    };
    request = request.with_sort(FeedSort::parse(sort)?);
    if let Some(filter) = time_filter {
        request = request.with_time_filter(TimeFilter::parse(filter)?);
    }
    if let Some(limit) = limit {
        request = request.with_limit(limit);
    }
    if let Some(after) = after {
        request = request.with_after(after);
    }
    if let Some(before) = before {
        request = request.with_before(before);
    }

    let feed = service.subreddit_feed(&request).await?;
    Ok(serde_json::to_value(feed)?)
}
