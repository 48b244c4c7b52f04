//! # Session Guard
//!
//! Owns the lifecycle of the shared browser session.
//!
//! - [`SessionGuard::ensure_ready`] is idempotent and single-flight: while an
//!   initialization round is running every caller awaits that same round, so
//!   concurrent requests never launch more than one browser.
//! - [`SessionGuard::run_with_retry`] wraps a unit of work that needs the
//!   session. Any failure, including an empty payload, invalidates the session
//!   so the next attempt starts from a fresh one.
//!
//! Only initialization is serialized; operations on a ready session run
//! concurrently.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vidpath_gateway::{ChromeEngine, Settings, session::SessionGuard};
//!
//! # tokio_test::block_on(async {
//! let settings = Settings::default();
//! let engine = Arc::new(ChromeEngine::new(settings.browser.clone()));
//! let guard = SessionGuard::new(engine, (&settings.guard).into());
//!
//! match guard.search_videos("rust lifetimes explained", 5).await {
//!     Ok(videos) => println!("found {} videos", videos.len()),
//!     Err(e) => eprintln!("search failed: {}", e),
//! }
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{EmptyCheck, RetryPolicy};
use crate::{
    AcquisitionError, Error, Result,
    engine::ScrapeEngine,
    types::VideoResult,
};

/// Lifecycle state of the shared session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Never started, invalidated or closed
    Uninitialized,
    /// An initialization round is in flight
    Initializing,
    /// The session is usable
    Ready,
    /// The last round exhausted its attempts
    Failed,
}

type Flight = Shared<BoxFuture<'static, std::result::Result<(), AcquisitionError>>>;

struct Inner {
    state: SessionState,
    in_flight: Option<Flight>,
    /// Bumped by `close`; rounds from an older epoch do not publish
    epoch: u64,
    /// Bumped by every successful round
    session: u64,
}

/// Bounded-retry manager for the shared browser session
pub struct SessionGuard {
    engine: Arc<dyn ScrapeEngine>,
    policy: RetryPolicy,
    inner: Arc<Mutex<Inner>>,
}

impl fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGuard")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl SessionGuard {
    /// Creates a guard around `engine`; nothing is launched until first use
    pub fn new(engine: Arc<dyn ScrapeEngine>, policy: RetryPolicy) -> Self {
        Self {
            engine,
            policy,
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::Uninitialized,
                in_flight: None,
                epoch: 0,
                session: 0,
            })),
        }
    }

    /// Snapshot of the session state
    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    /// Makes sure the session is ready, initializing it at most once at a time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Acquisition`] when the round exhausts
    /// `max_init_attempts`. Every caller that joined the round gets the same
    /// error; the next call starts a new round.
    pub async fn ensure_ready(&self) -> Result<()> {
        self.ready_session().await.map(|_| ())
    }

    /// Like `ensure_ready`, also returning the id of the ready session
    async fn ready_session(&self) -> Result<u64> {
        let flight = {
            let mut inner = self.inner.lock().await;
            if inner.state == SessionState::Ready {
                return Ok(inner.session);
            }
            match &inner.in_flight {
                Some(flight) => {
                    debug!("Joining in-flight session initialization");
                    flight.clone()
                }
                None => {
                    let flight = self.start_round(inner.epoch).boxed().shared();
                    inner.state = SessionState::Initializing;
                    inner.in_flight = Some(flight.clone());
                    flight
                }
            }
        };

        flight.await?;
        Ok(self.inner.lock().await.session)
    }

    fn start_round(
        &self,
        epoch: u64,
    ) -> impl Future<Output = std::result::Result<(), AcquisitionError>> + Send + 'static {
        let engine = Arc::clone(&self.engine);
        let inner = Arc::clone(&self.inner);
        let policy = self.policy.clone();

        async move {
            let outcome = acquire(engine.as_ref(), &policy).await;

            let mut inner = inner.lock().await;
            if inner.epoch == epoch {
                inner.in_flight = None;
                if outcome.is_ok() {
                    inner.session += 1;
                    inner.state = SessionState::Ready;
                } else {
                    inner.state = SessionState::Failed;
                }
            }
            outcome
        }
    }

    /// Marks the session unusable so the next `ensure_ready` re-acquires it.
    ///
    /// A round that is already in flight is left alone.
    pub async fn invalidate(&self) {
        let mut inner = self.inner.lock().await;
        if matches!(inner.state, SessionState::Ready | SessionState::Failed) {
            debug!("Session invalidated");
            inner.state = SessionState::Uninitialized;
        }
    }

    /// Invalidates only if `session` is still the current one
    async fn invalidate_session(&self, session: u64) {
        let mut inner = self.inner.lock().await;
        if inner.state == SessionState::Ready && inner.session != session {
            debug!("Session already replaced, skipping invalidation");
            return;
        }
        if matches!(inner.state, SessionState::Ready | SessionState::Failed) {
            debug!("Session invalidated");
            inner.state = SessionState::Uninitialized;
        }
    }

    /// Runs `operation` against a ready session, retrying up to `max_retries`
    /// extra times.
    ///
    /// An empty payload (see [`EmptyCheck`]) counts as a failure. After each
    /// failure the session is invalidated and the guard waits
    /// `operation_backoff_step * (attempt + 1)` before the next attempt.
    ///
    /// # Errors
    ///
    /// [`Error::OperationExhausted`] with the message
    /// `"<label> failed after all retry attempts"`; the last failure is kept
    /// as its source.
    pub async fn run_with_retry<T, F, Fut>(
        &self,
        mut operation: F,
        label: &str,
        max_retries: u32,
    ) -> Result<T>
    where
        T: EmptyCheck,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let total = max_retries.saturating_add(1);
        let mut last_error = None;

        for attempt in 0..total {
            let mut session = None;
            let outcome = match self.ready_session().await {
                Ok(id) => {
                    session = Some(id);
                    match operation().await {
                        Ok(value) if value.is_empty_result() => Err(Error::empty_result(label)),
                        other => other,
                    }
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(value) => {
                    if attempt > 0 {
                        info!("{} succeeded on attempt {}/{}", label, attempt + 1, total);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    warn!("{} attempt {}/{} failed: {}", label, attempt + 1, total, e);
                    match session {
                        Some(id) => self.invalidate_session(id).await,
                        None => self.invalidate().await,
                    }
                    last_error = Some(e);

                    if attempt + 1 < total {
                        let delay = self.policy.operation_delay(attempt);
                        debug!("Retrying {} in {:?}", label, delay);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        let source = last_error
            .unwrap_or_else(|| Error::internal(format!("{} made no attempts", label)));
        Err(Error::exhausted(label, source))
    }

    /// `run_with_retry` with the configured retry budget
    pub async fn run<T, F, Fut>(&self, operation: F, label: &str) -> Result<T>
    where
        T: EmptyCheck,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_with_retry(operation, label, self.policy.operation_retries)
            .await
    }

    /// Guarded video search
    pub async fn search_videos(&self, query: &str, limit: usize) -> Result<Vec<VideoResult>> {
        self.run(|| self.engine.search_videos(query, limit), "searchVideos")
            .await
    }

    /// Guarded best-video lookup
    pub async fn best_video(&self, query: &str) -> Result<VideoResult> {
        self.run(|| self.engine.get_best_video(query), "getBestVideo")
            .await
    }

    /// Drops the session and releases the browser
    pub async fn close(&self) {
        {
            let mut inner = self.inner.lock().await;
            inner.epoch += 1;
            inner.in_flight = None;
            inner.state = SessionState::Uninitialized;
        }
        info!("Closing browser session");
        self.engine.close().await;
    }
}

/// One initialization round: up to `max_init_attempts` acquisition calls
async fn acquire(
    engine: &dyn ScrapeEngine,
    policy: &RetryPolicy,
) -> std::result::Result<(), AcquisitionError> {
    let mut attempts = 0;
    loop {
        attempts += 1;
        match engine.initialize().await {
            Ok(()) => {
                info!("Browser session ready after {} attempt(s)", attempts);
                return Ok(());
            }
            Err(e) if attempts >= policy.max_init_attempts => {
                warn!("Browser initialization gave up after {} attempts: {}", attempts, e);
                return Err(AcquisitionError {
                    attempts,
                    last_error: e.to_string(),
                });
            }
            Err(e) => {
                let delay = policy.init_delay(attempts);
                warn!(
                    "Browser initialization attempt {}/{} failed: {}; retrying in {:?}",
                    attempts, policy.max_init_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mock::MockEngine;
    use futures::future::join_all;
    use std::error::Error as _;
    use std::time::Duration;
    use tokio::time::Instant;

    fn guard_with(engine: &Arc<MockEngine>) -> SessionGuard {
        SessionGuard::new(engine.clone(), RetryPolicy::default())
    }

    /// Paused-clock durations land on timer ticks
    fn assert_about(actual: Duration, expected: Duration) {
        let diff = actual.abs_diff(expected);
        assert!(
            diff <= Duration::from_millis(5),
            "expected about {:?}, got {:?}",
            expected,
            actual
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_ensure_ready_single_flight() {
        let engine = Arc::new(MockEngine::new().with_init_latency(Duration::from_millis(200)));
        let guard = guard_with(&engine);

        let results = join_all((0..16).map(|_| guard.ensure_ready())).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(engine.init_calls(), 1);
        assert_eq!(guard.state().await, SessionState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_waiters_share_exhaustion() {
        let engine = Arc::new(
            MockEngine::new()
                .failing_init(u32::MAX)
                .with_init_latency(Duration::from_millis(50)),
        );
        let guard = guard_with(&engine);

        let results = join_all((0..8).map(|_| guard.ensure_ready())).await;

        assert_eq!(engine.init_calls(), 3);
        for result in results {
            match result {
                Err(Error::Acquisition(e)) => {
                    assert_eq!(e.attempts, 3);
                    assert!(e.last_error.contains("chrome failed to launch"));
                }
                other => panic!("expected acquisition error, got {:?}", other),
            }
        }
        assert_eq!(guard.state().await, SessionState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_follows_exponential_schedule() {
        let engine = Arc::new(MockEngine::new().failing_init(u32::MAX));
        let guard = guard_with(&engine);

        let start = Instant::now();
        let err = guard.ensure_ready().await.unwrap_err();

        assert!(matches!(err, Error::Acquisition(AcquisitionError { attempts: 3, .. })));
        let times = engine.init_times();
        assert_eq!(times.len(), 3);
        assert_about(times[1] - times[0], Duration::from_secs(2));
        assert_about(times[2] - times[1], Duration::from_secs(4));
        // no wait after the final attempt
        assert_about(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_state_is_not_terminal() {
        let engine = Arc::new(MockEngine::new().failing_init(3));
        let guard = guard_with(&engine);

        assert!(guard.ensure_ready().await.is_err());
        assert_eq!(guard.state().await, SessionState::Failed);

        guard.ensure_ready().await.unwrap();
        assert_eq!(engine.init_calls(), 4);
        assert_eq!(guard.state().await, SessionState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_caller_during_backoff_joins_round() {
        let engine = Arc::new(MockEngine::new().failing_init(1));
        let guard = guard_with(&engine);

        let (first, second) = tokio::join!(guard.ensure_ready(), async {
            // first attempt has failed, the round is sleeping out its 2s backoff
            tokio::time::sleep(Duration::from_secs(1)).await;
            assert_eq!(guard.state().await, SessionState::Initializing);
            guard.ensure_ready().await
        });

        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(engine.init_calls(), 2);
        assert_eq!(guard.state().await, SessionState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_acquisition_once_ready() {
        let engine = Arc::new(MockEngine::new());
        let guard = guard_with(&engine);

        for _ in 0..5 {
            guard.ensure_ready().await.unwrap();
        }
        assert_eq!(engine.init_calls(), 1);

        guard.invalidate().await;
        assert_eq!(guard.state().await, SessionState::Uninitialized);
        guard.ensure_ready().await.unwrap();
        assert_eq!(engine.init_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_invalidates_then_retry_succeeds() {
        let engine = Arc::new(MockEngine::new().with_searches(vec![
            Err(Error::scrape(crate::ScrapeErrorKind::Timeout, "navigation timed out")),
            Ok(vec![MockEngine::video(7)]),
        ]));
        let guard = guard_with(&engine);

        let start = Instant::now();
        let videos = guard
            .run_with_retry(|| engine.search_videos("rust", 5), "searchVideos", 2)
            .await
            .unwrap();

        assert_eq!(videos, vec![MockEngine::video(7)]);
        assert_eq!(engine.search_calls(), 2);
        assert_eq!(engine.init_calls(), 2);
        assert_about(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_result_is_retried() {
        let engine = Arc::new(MockEngine::new().with_searches(vec![
            Ok(vec![]),
            Ok(vec![]),
            Ok(vec![MockEngine::video(1)]),
        ]));
        let guard = guard_with(&engine);

        let start = Instant::now();
        let videos = guard.search_videos("rust", 5).await.unwrap();

        assert_eq!(videos.len(), 1);
        assert_eq!(engine.search_calls(), 3);
        assert_eq!(engine.init_calls(), 3);
        // 2s after attempt 0, 4s after attempt 1
        assert_about(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_message_is_fixed() {
        let engine = Arc::new(MockEngine::new());
        let guard = guard_with(&engine);
        let mut calls = 0;

        let err = guard
            .run_with_retry(
                || {
                    calls += 1;
                    async { Err::<Vec<VideoResult>, _>(Error::internal("boom")) }
                },
                "searchVideos",
                2,
            )
            .await
            .unwrap_err();

        assert_eq!(calls, 3);
        assert_eq!(err.to_string(), "searchVideos failed after all retry attempts");
        assert!(err.source().unwrap().to_string().contains("boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_exhaustion_keeps_empty_source() {
        let engine = Arc::new(MockEngine::new());
        let guard = guard_with(&engine);

        let err = guard
            .run_with_retry(|| async { Ok(Vec::<VideoResult>::new()) }, "searchVideos", 1)
            .await
            .unwrap_err();

        match err {
            Error::OperationExhausted { label, source } => {
                assert_eq!(label, "searchVideos");
                assert_eq!(source.to_string(), "searchVideos returned empty result");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquisition_failure_counts_as_attempt() {
        let engine = Arc::new(MockEngine::new().failing_init(u32::MAX));
        let mut policy = RetryPolicy::default();
        policy.max_init_attempts = 1;
        let guard = SessionGuard::new(engine.clone(), policy);

        let err = guard.search_videos("rust", 5).await.unwrap_err();

        assert_eq!(engine.search_calls(), 0);
        assert_eq!(engine.init_calls(), 3);
        match err {
            Error::OperationExhausted { source, .. } => {
                assert!(matches!(*source, Error::Acquisition(_)));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_operations_run_concurrently_after_ready() {
        let engine = Arc::new(MockEngine::new().with_init_latency(Duration::from_millis(100)));
        let guard = guard_with(&engine);

        let start = Instant::now();
        let results = join_all((0..4).map(|i| {
            let guard = &guard;
            async move {
                guard
                    .run_with_retry(
                        || async move {
                            tokio::time::sleep(Duration::from_secs(1)).await;
                            Ok(vec![i])
                        },
                        "slowOp",
                        0,
                    )
                    .await
            }
        }))
        .await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(engine.init_calls(), 1);
        assert_about(start.elapsed(), Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_failure_does_not_invalidate_new_session() {
        let engine = Arc::new(MockEngine::new());
        let guard = guard_with(&engine);

        let old = guard.ready_session().await.unwrap();
        guard.invalidate().await;
        let new = guard.ready_session().await.unwrap();
        assert_ne!(old, new);

        guard.invalidate_session(old).await;
        assert_eq!(guard.state().await, SessionState::Ready);

        guard.invalidate_session(new).await;
        assert_eq!(guard.state().await, SessionState::Uninitialized);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_releases_engine_and_resets_state() {
        let engine = Arc::new(MockEngine::new());
        let guard = guard_with(&engine);

        guard.ensure_ready().await.unwrap();
        guard.close().await;

        assert!(engine.is_closed());
        assert_eq!(guard.state().await, SessionState::Uninitialized);

        guard.ensure_ready().await.unwrap();
        assert_eq!(engine.init_calls(), 2);
    }
}
