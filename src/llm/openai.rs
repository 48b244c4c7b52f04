//! OpenAI-compatible chat completions client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::{CompletionRequest, LanguageModel};
use crate::{Error, ModelErrorKind, Result, config::LlmSettings};

const SYSTEM_PROMPT: &str =
    "You are an educational content assistant. When asked for JSON, answer with JSON only.";

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

/// Client for `POST {api_base}/chat/completions`
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    api_base: String,
    api_key: String,
}

impl OpenAiClient {
    /// Create a client for `api_base` authenticated with `api_key`
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Client from settings, or `None` when no API key is configured
    pub fn from_settings(settings: &LlmSettings) -> Result<Option<Self>> {
        match settings.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Self::new(&settings.api_base, key).map(Some),
            _ => Ok(None),
        }
    }

    fn classify(status: StatusCode, body: &str) -> Error {
        let kind = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ModelErrorKind::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => ModelErrorKind::RateLimited,
            _ => ModelErrorKind::Upstream,
        };
        let snippet: String = body.chars().take(200).collect();
        Error::model(kind, format!("API returned {}: {}", status, snippet))
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = json!({
            "model": request.model,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": request.prompt},
            ],
        });

        tracing::debug!("Requesting completion from {} ({})", url, request.model);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::classify(status, &text));
        }

        let completion: ChatCompletion = response.json().await.map_err(|e| {
            Error::model(
                ModelErrorKind::Malformed,
                format!("Unreadable completion: {}", e),
            )
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| Error::model(ModelErrorKind::Malformed, "Completion has no content"))
    }
}
