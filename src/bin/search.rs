//! One-shot video search
//!
//! Runs a single guarded search against a fresh browser session, prints the
//! result as JSON on stdout and closes the browser.
//!
//! # Usage
//!
//! ```bash
//! vidpath-search "rust ownership" --limit 5
//! vidpath-search "rust ownership" --best
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use vidpath_gateway::{
    ChromeEngine,
    cli::init_logging,
    config::ConfigLoader,
    session::SessionGuard,
    types::{BestVideoRequest, SearchRequest},
};

/// Search videos once and print them as JSON
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Search query
    query: String,

    /// Maximum number of results
    #[arg(short, long)]
    limit: Option<usize>,

    /// Print only the best match
    #[arg(short, long)]
    best: bool,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = ConfigLoader::new()
        .load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    init_logging(cli.verbose || settings.logging.verbose, &settings.logging.level);

    // validate before launching a browser
    let (query, limit) = if cli.best {
        (BestVideoRequest::new(&cli.query).validate()?, 1)
    } else {
        let mut request = SearchRequest::new(&cli.query);
        request.limit = cli.limit;
        request.validate()?
    };

    let engine = Arc::new(ChromeEngine::new(settings.browser.clone()));
    let guard = SessionGuard::new(engine, (&settings.guard).into());

    let output = if cli.best {
        guard
            .best_video(&query)
            .await
            .map(|video| serde_json::to_string_pretty(&video))
    } else {
        guard
            .search_videos(&query, limit)
            .await
            .map(|videos| serde_json::to_string_pretty(&videos))
    };
    guard.close().await;

    println!("{}", output??);
    Ok(())
}
