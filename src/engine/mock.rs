//! Scripted in-memory engine for unit tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::ScrapeEngine;
use crate::{Error, Result, ScrapeErrorKind, types::VideoResult};

#[derive(Default)]
pub(crate) struct MockEngine {
    /// Initializations that fail before one succeeds; `u32::MAX` fails forever
    init_failures: AtomicU32,
    init_latency: Duration,
    init_calls: AtomicU32,
    init_times: Mutex<Vec<Instant>>,
    search_calls: AtomicU32,
    searches: Mutex<VecDeque<Result<Vec<VideoResult>>>>,
    closed: AtomicBool,
}

impl MockEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_init(self, failures: u32) -> Self {
        self.init_failures.store(failures, Ordering::SeqCst);
        self
    }

    pub(crate) fn with_init_latency(mut self, latency: Duration) -> Self {
        self.init_latency = latency;
        self
    }

    /// Queue search outcomes; once drained, searches return one fixed video
    pub(crate) fn with_searches(self, outcomes: Vec<Result<Vec<VideoResult>>>) -> Self {
        *self.searches.lock().unwrap() = outcomes.into();
        self
    }

    pub(crate) fn init_calls(&self) -> u32 {
        self.init_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn init_times(&self) -> Vec<Instant> {
        self.init_times.lock().unwrap().clone()
    }

    pub(crate) fn search_calls(&self) -> u32 {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn video(n: u32) -> VideoResult {
        VideoResult::new(
            format!("Video {}", n),
            format!("https://www.youtube.com/watch?v=vid{:08}", n),
        )
    }
}

#[async_trait]
impl ScrapeEngine for MockEngine {
    async fn initialize(&self) -> Result<()> {
        self.init_calls.fetch_add(1, Ordering::SeqCst);
        self.init_times.lock().unwrap().push(Instant::now());
        if !self.init_latency.is_zero() {
            tokio::time::sleep(self.init_latency).await;
        }

        let remaining = self.init_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != u32::MAX {
                self.init_failures.store(remaining - 1, Ordering::SeqCst);
            }
            return Err(Error::scrape(ScrapeErrorKind::Browser, "chrome failed to launch"));
        }
        self.closed.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    async fn search_videos(&self, _query: &str, limit: usize) -> Result<Vec<VideoResult>> {
        let n = self.search_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.searches.lock().unwrap().pop_front();
        match scripted {
            Some(outcome) => outcome,
            None => Ok((0..limit.min(3) as u32).map(|i| Self::video(n * 10 + i)).collect()),
        }
    }

    async fn get_best_video(&self, query: &str) -> Result<VideoResult> {
        self.search_videos(query, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::scrape(ScrapeErrorKind::NoResults, "no video found"))
    }
}
