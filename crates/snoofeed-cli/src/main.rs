mod cli;
mod commands;
mod error;
mod output;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use snoofeed_core::{Config, RedditService, ReqwestHttpClient};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();

    let config = Config::from_env();
    tracing::info!(
        cache_capacity = config.cache.capacity,
        cache_ttl_secs = config.cache.ttl.as_secs(),
        rate_limit_calls = config.rate_limit.calls_per_window,
        "starting snoofeed"
    );
    let http = Arc::new(ReqwestHttpClient::new(&config.request));
    let service = RedditService::new(config, http);

    let result = commands::run(&cli, &service).await?;
    output::render(&result, cli.pretty)
}
