use serde_json::Value;
use snoofeed_core::{RedditService, SearchRequest, SearchSort, SubredditName, TimeFilter};

use crate::error::CliError;

pub async fn run(
    service: &RedditService,
    query: &str,
    subreddit: Option<&str>,
    sort: &str,
    time_filter: Option<&str>,
    limit: Option<u32>,
    after: Option<&str>,
) -> Result<Value, CliError> {
    let mut request = SearchRequest::new(query).with_sort(SearchSort::parse(sort)?);
    if let Some(name) = subreddit {
        request = request.in_subreddit(SubredditName::parse(name)?);
    }
    if let Some(filter) = time_filter {
        request = request.with_time_filter(TimeFilter::parse(filter)?);
    }
    if let Some(limit) = limit {
        request = request.with_limit(limit);
    }
    if let Some(after) = after {
        request = request.with_after(after);
    }

    let results = service.search(&request).await?;
    Ok(serde_json::to_value(results)?)
}
