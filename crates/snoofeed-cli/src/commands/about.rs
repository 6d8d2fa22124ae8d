use serde_json::Value;
use snoofeed_core::{RedditService, SubredditName};

use crate::error::CliError;

pub async fn run(service: &RedditService, subreddit: &str) -> Result<Value, CliError> {
    let info = service.subreddit_about(&SubredditName::parse(subreddit)?).await?;
    Ok(serde_json::to_value(info)?)
}
