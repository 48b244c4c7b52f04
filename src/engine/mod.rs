//! Scrape engine seam
//!
//! The engine owns the browser. The session guard decides when it is
//! (re)initialized; the engine only knows how.

pub mod chrome;
#[cfg(test)]
pub(crate) mod mock;

pub use chrome::ChromeEngine;

use async_trait::async_trait;

use crate::{Result, types::VideoResult};

/// Video search backend driven by an expensive, fallible session
#[async_trait]
pub trait ScrapeEngine: Send + Sync {
    /// Start a fresh session, replacing any previous one
    async fn initialize(&self) -> Result<()>;

    /// Release the session; a no-op when none is open
    async fn close(&self);

    /// Search for up to `limit` videos matching `query`
    async fn search_videos(&self, query: &str, limit: usize) -> Result<Vec<VideoResult>>;

    /// Most relevant video for `query`
    async fn get_best_video(&self, query: &str) -> Result<VideoResult>;
}
