//! Axum application setup
//!
//! Creates and configures the Axum application with routes and middleware.

use crate::{
    Error, Result,
    config::Settings,
    engine::ChromeEngine,
    llm::{ContentGenerator, OpenAiClient},
    session::SessionGuard,
};
use axum::{
    BoxError, Router,
    error_handling::HandleErrorLayer,
    routing::{get, post},
};
use std::sync::Arc;
use tower::{ServiceBuilder, timeout::TimeoutLayer, timeout::error::Elapsed};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers::ApiError;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Guard around the shared browser session
    pub guard: Arc<SessionGuard>,
    /// Model-backed content generation, absent without an API key
    pub content: Option<ContentGenerator>,
    /// Application settings
    pub settings: Arc<Settings>,
    /// Server start time for uptime calculation
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Assemble state from already-built parts
    pub fn new(guard: Arc<SessionGuard>, content: Option<ContentGenerator>, settings: Settings) -> Self {
        Self {
            guard,
            content,
            settings: Arc::new(settings),
            start_time: std::time::Instant::now(),
        }
    }

    /// Production state: Chromium engine and, when configured, the OpenAI client
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let engine = Arc::new(ChromeEngine::new(settings.browser.clone()));
        let guard = Arc::new(SessionGuard::new(engine, (&settings.guard).into()));

        let content = OpenAiClient::from_settings(&settings.llm)?
            .map(|client| ContentGenerator::new(Arc::new(client), settings.llm.clone()));
        if content.is_none() {
            tracing::warn!("No OpenAI API key configured; quiz and learning path endpoints are disabled");
        }

        Ok(Self::new(guard, content, settings))
    }
}

/// Middleware failures rendered through the same envelope as handler errors
async fn handle_layer_error(timeout_secs: u64, err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError(Error::RequestTimeout { secs: timeout_secs })
    } else {
        ApiError(Error::server(err.to_string()))
    }
}

/// Create the main Axum application with routes and middleware
pub fn create_app(state: AppState) -> Router {
    let timeout = state.settings.server.timeout();
    let timeout_secs = state.settings.server.timeout_secs;

    Router::new()
        .route("/ping", get(super::handlers::ping))
        .route("/api/videos/search", post(super::handlers::search_videos))
        .route("/api/videos/best", post(super::handlers::best_video))
        .route("/api/quiz", post(super::handlers::quiz))
        .route("/api/learning-path", post(super::handlers::learning_path))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(HandleErrorLayer::new(move |err: BoxError| {
                    handle_layer_error(timeout_secs, err)
                }))
                .layer(TimeoutLayer::new(timeout)),
        )
        .with_state(state)
}
