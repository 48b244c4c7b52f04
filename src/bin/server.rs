//! HTTP gateway binary
//!
//! Serves video search and model-generated learning content over a shared,
//! guarded headless browser session.
//!
//! # Usage
//!
//! ```bash
//! vidpath-server --port 4417 --host 0.0.0.0
//! ```
//!
//! # API Endpoints
//!
//! - `GET /ping`: Health check with session state
//! - `POST /api/videos/search`: Search videos
//! - `POST /api/videos/best`: Best video for a query
//! - `POST /api/quiz`: Quiz about the best video for a topic
//! - `POST /api/learning-path`: Learning path with a video per step

use std::path::PathBuf;

use clap::Parser;
use vidpath_gateway::cli::{ServerArgs, run_server_mode};

/// HTTP gateway for guarded video search
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Port to listen on [default: 4417]
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to [default: ::]
    #[arg(long)]
    host: Option<String>,

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

    run_server_mode(ServerArgs {
        port: cli.port,
        host: cli.host,
        config: cli.config,
        verbose: cli.verbose,
    })
    .await
}
