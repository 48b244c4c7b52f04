//! HTTP request handlers
//!
//! Implementation of HTTP endpoints for the gateway. Every failure is rendered
//! as the `{success: false, error, details?}` envelope.

use std::error::Error as _;

use axum::{
    Json as RequestJson,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use futures::future::join_all;

use crate::{
    Error, ModelErrorKind,
    llm::ContentGenerator,
    server::app::AppState,
    types::{
        ApiResponse, BestVideoRequest, LearningPath, LearningPathRequest, PingResponse,
        QuizRequest, QuizResponse, SearchRequest, VideoResult,
    },
    utils::version,
};

/// Hint sent with failures that may clear up on their own
const RETRY_AFTER_SECS: &str = "30";

/// Handler error rendered as a failure envelope
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }

        let mut body = ApiResponse::<()>::failure(self.0.to_string());
        if let Some(source) = self.0.source() {
            body = body.with_details(source.to_string());
        }
        let retry_after = self
            .0
            .is_retryable()
            .then_some([(header::RETRY_AFTER, RETRY_AFTER_SECS)]);
        (status, retry_after, Json(body)).into_response()
    }
}

/// Status code for an error
///
/// Exhaustion maps to 503 so clients know retrying later may succeed, unless
/// every attempt simply found nothing.
fn status_for(error: &Error) -> StatusCode {
    if error.is_not_found() {
        return StatusCode::NOT_FOUND;
    }
    match error {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::RequestTimeout { .. } => StatusCode::REQUEST_TIMEOUT,
        Error::Acquisition(_) | Error::OperationExhausted { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        Error::LanguageModel { kind, .. } => match kind {
            ModelErrorKind::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            ModelErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::BAD_GATEWAY,
        },
        Error::NoJsonFound { .. } | Error::Scrape { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn content_generator(state: &AppState) -> Result<&ContentGenerator, ApiError> {
    state.content.as_ref().ok_or_else(|| {
        ApiError(Error::model(
            ModelErrorKind::NotConfigured,
            "OPENAI_API_KEY is not set",
        ))
    })
}

/// Ping endpoint for health checks
///
/// GET /ping
///
/// Returns server status, uptime and the browser session state.
pub async fn ping(State(state): State<AppState>) -> Json<PingResponse> {
    let uptime = state.start_time.elapsed().as_secs();
    let session = state.guard.state().await;
    let response = PingResponse::new(uptime, version::get_version(), session);

    tracing::debug!(
        "Ping response: uptime={}s, version={}, session={:?}",
        uptime,
        version::get_version(),
        session
    );
    Json(response)
}

/// Video search endpoint
///
/// POST /api/videos/search
pub async fn search_videos(
    State(state): State<AppState>,
    payload: Result<RequestJson<SearchRequest>, JsonRejection>,
) -> ApiResult<Vec<VideoResult>> {
    let RequestJson(request) = payload?;
    let (query, limit) = request.validate()?;
    tracing::debug!("Received search request: query={:?}, limit={}", query, limit);

    let videos = state.guard.search_videos(&query, limit).await?;
    tracing::info!("Search for {:?} returned {} videos", query, videos.len());
    Ok(Json(ApiResponse::ok(videos)))
}

/// Best video endpoint
///
/// POST /api/videos/best
pub async fn best_video(
    State(state): State<AppState>,
    payload: Result<RequestJson<BestVideoRequest>, JsonRejection>,
) -> ApiResult<VideoResult> {
    let RequestJson(request) = payload?;
    let query = request.validate()?;

    let video = state.guard.best_video(&query).await?;
    tracing::info!("Best video for {:?}: {}", query, video.url);
    Ok(Json(ApiResponse::ok(video)))
}

/// Quiz endpoint
///
/// POST /api/quiz
///
/// Finds the best video for the topic and asks the model for a quiz about it.
pub async fn quiz(
    State(state): State<AppState>,
    payload: Result<RequestJson<QuizRequest>, JsonRejection>,
) -> ApiResult<QuizResponse> {
    let RequestJson(request) = payload?;
    let (topic, count) = request.validate()?;
    let generator = content_generator(&state)?;

    let video = state.guard.best_video(&topic).await?;
    let quiz = generator.quiz(&topic, &video, count).await?;

    tracing::info!("Generated {}-question quiz for {:?}", quiz.questions.len(), topic);
    Ok(Json(ApiResponse::ok(QuizResponse { video, quiz })))
}

/// Learning path endpoint
///
/// POST /api/learning-path
///
/// Steps whose video lookup fails are returned with `video: null`.
pub async fn learning_path(
    State(state): State<AppState>,
    payload: Result<RequestJson<LearningPathRequest>, JsonRejection>,
) -> ApiResult<LearningPath> {
    let RequestJson(request) = payload?;
    let (topic, steps) = request.validate()?;
    let generator = content_generator(&state)?;

    let mut path = generator.learning_path(&topic, steps).await?;

    let lookups = path
        .steps
        .iter()
        .map(|step| state.guard.best_video(&step.search_query));
    let videos = join_all(lookups).await;

    for (step, video) in path.steps.iter_mut().zip(videos) {
        match video {
            Ok(video) => step.video = Some(video),
            Err(e) => tracing::warn!("No video for step {:?}: {}", step.title, e),
        }
    }

    Ok(Json(ApiResponse::ok(path)))
}
