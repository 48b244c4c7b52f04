//! Language-model service
//!
//! Turns free text into structured JSON. The [`LanguageModel`] trait is the
//! seam; [`OpenAiClient`] talks to any OpenAI-compatible chat completions API.

pub mod content;
pub mod extract;
pub mod openai;

pub use content::ContentGenerator;
pub use extract::extract_json;
pub use openai::OpenAiClient;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{Error, ModelErrorKind, Result, config::LlmSettings};

/// One completion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// User prompt
    pub prompt: String,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token limit
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Request with the configured model options
    pub fn new(prompt: impl Into<String>, settings: &LlmSettings) -> Self {
        Self {
            prompt: prompt.into(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }

    /// Override the token limit
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Text completion backend
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Completion text for `request`
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Complete, pull the JSON out of the answer and decode it
pub async fn complete_json<T: DeserializeOwned>(
    model: &dyn LanguageModel,
    request: &CompletionRequest,
) -> Result<T> {
    let text = model.complete(request).await?;
    let json = extract_json(&text)?;
    serde_json::from_str(json).map_err(|e| {
        Error::model(
            ModelErrorKind::Malformed,
            format!("Reply does not match the requested shape: {}", e),
        )
    })
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedModel;
    use super::*;
    use crate::Error;

    #[derive(Debug, Deserialize)]
    struct Steps {
        steps: Vec<String>,
    }

    #[test]
    fn test_request_uses_settings() {
        let settings = LlmSettings::default();
        let request = CompletionRequest::new("hello", &settings).with_max_tokens(64);
        assert_eq!(request.model, settings.model);
        assert_eq!(request.max_tokens, 64);
    }

    #[tokio::test]
    async fn test_complete_json_decodes_fenced_reply() {
        let model = ScriptedModel::new(vec![Ok(
            "```json\n{\"steps\": [\"a\", \"b\"]}\n```".to_string()
        )]);
        let request = CompletionRequest::new("plan", &LlmSettings::default());

        let steps: Steps = complete_json(&model, &request).await.unwrap();
        assert_eq!(steps.steps, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_complete_json_wrong_shape_is_malformed() {
        let model = ScriptedModel::new(vec![Ok("{\"other\": 1}".to_string())]);
        let request = CompletionRequest::new("plan", &LlmSettings::default());

        let err = complete_json::<Steps>(&model, &request).await.unwrap_err();
        match err {
            Error::LanguageModel {
                kind: ModelErrorKind::Malformed,
                message,
            } => assert!(message.contains("missing field `steps`"), "{}", message),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
