use serde_json::Value;
use snoofeed_core::{ContentType, RedditService, TimeFilter, UserFeedRequest, UserSort, Username};

use crate::error::CliError;

pub async fn run(
    service: &RedditService,
    username: &str,
    content_type: &str,
    sort: &str,
    time_filter: Option<&str>,
    limit: Option<u32>,
    after: Option<&str>,
) -> Result<Value, CliError> {
    let mut request = UserFeedRequest::new(Username::parse(username)?)
        .with_content_type(ContentType::parse(content_type)?)
        .with_sort(UserSort::parse(sort)?);
    if let Some(filter) = time_filter {
        request = request.with_time_filter(TimeFilter::parse(filter)?);
    }
    if let Some(limit) = limit {
        request = request.with_limit(limit);
    }
    if let Some(after) = after {
        request = request.with_after(after);
    }

    let feed = service.user_feed(&request).await?;
    Ok(serde_json::to_value(feed)?)
}
