//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use vidpath_gateway::{Error, Result, ScrapeEngine, ScrapeErrorKind, VideoResult};

/// Engine whose first `init_failures` initializations fail
#[derive(Default)]
pub struct FlakyEngine {
    init_failures: AtomicU32,
    init_latency: Duration,
    init_calls: AtomicU32,
    search_calls: AtomicU32,
    empty_searches: AtomicU32,
    queries: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl FlakyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_init(self, failures: u32) -> Self {
        self.init_failures.store(failures, Ordering::SeqCst);
        self
    }

    pub fn with_init_latency(mut self, latency: Duration) -> Self {
        self.init_latency = latency;
        self
    }

    /// The next `count` searches come back empty
    pub fn empty_searches(self, count: u32) -> Self {
        self.empty_searches.store(count, Ordering::SeqCst);
        self
    }

    pub fn init_calls(&self) -> u32 {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> u32 {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScrapeEngine for FlakyEngine {
    async fn initialize(&self) -> Result<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.init_latency).await;

        let remaining = self.init_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.init_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::scrape(ScrapeErrorKind::Browser, "launch failed"));
        }
        Ok(())
    }

    async fn close(&self) {}

    async fn search_videos(&self, query: &str, limit: usize) -> Result<Vec<VideoResult>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());

        let empty = self.empty_searches.load(Ordering::SeqCst);
        if empty > 0 {
            self.empty_searches.store(empty - 1, Ordering::SeqCst);
            return Ok(Vec::new());
        }

        Ok((0..limit)
            .map(|i| {
                VideoResult::new(
                    format!("{} #{}", query, i),
                    format!("https://www.youtube.com/watch?v=test{:07}", i),
                )
            })
            .collect())
    }

    async fn get_best_video(&self, query: &str) -> Result<VideoResult> {
        self.search_videos(query, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::scrape(ScrapeErrorKind::NoResults, "no video found"))
    }
}
