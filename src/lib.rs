//! vidpath gateway
//!
//! Video search and learning-content gateway built around a single shared
//! headless browser session. Every browser-backed call goes through a
//! [`SessionGuard`], which initializes the browser lazily and exactly once for
//! any number of concurrent callers, then retries failed or empty operations
//! with backoff and re-initialization.
//!
//! # Architecture
//!
//! - [`session`]: the guard, its retry policy and empty-payload detection
//! - [`engine`]: the scraping seam and its Chromium implementation
//! - [`llm`]: OpenAI-compatible client, JSON extraction and content prompts
//! - [`server`]: Axum routes exposing search, quizzes and learning paths
//!
//! # Usage
//!
//! ## HTTP Server Mode
//!
//! ```bash
//! vidpath-server --port 4417 --host 0.0.0.0
//! ```
//!
//! ## One-shot Search
//!
//! ```bash
//! vidpath-search "rust ownership" --limit 5
//! ```
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vidpath_gateway::{ChromeEngine, Settings, SessionGuard};
//!
//! # async fn example() -> vidpath_gateway::Result<()> {
//! let settings = Settings::default();
//! let engine = Arc::new(ChromeEngine::new(settings.browser.clone()));
//! let guard = SessionGuard::new(engine, (&settings.guard).into());
//!
//! let videos = guard.search_videos("rust ownership", 5).await?;
//! println!("{} videos", videos.len());
//! guard.close().await;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod llm;
pub mod server;
pub mod session;
pub mod types;
pub mod utils;

pub use config::Settings;
pub use engine::{ChromeEngine, ScrapeEngine};
pub use error::{AcquisitionError, Error, ModelErrorKind, Result, ScrapeErrorKind};
pub use session::{SessionGuard, SessionState};
pub use types::VideoResult;
