//! Learning paths and quizzes generated by the language model

use std::sync::Arc;

use serde::Deserialize;

use super::{CompletionRequest, LanguageModel, complete_json};
use crate::{
    Error, ModelErrorKind, Result,
    config::LlmSettings,
    types::{LearningPath, LearningStep, Quiz, VideoResult},
};

#[derive(Debug, Deserialize)]
struct PathDraft {
    steps: Vec<LearningStep>,
}

/// Prompts the model and validates what comes back
#[derive(Clone)]
pub struct ContentGenerator {
    model: Arc<dyn LanguageModel>,
    settings: LlmSettings,
}

impl std::fmt::Debug for ContentGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentGenerator")
            .field("model", &self.settings.model)
            .finish_non_exhaustive()
    }
}

impl ContentGenerator {
    /// Create a generator over `model`
    pub fn new(model: Arc<dyn LanguageModel>, settings: LlmSettings) -> Self {
        Self { model, settings }
    }

    /// Multiple-choice quiz about `video`, at most `count` questions
    pub async fn quiz(&self, topic: &str, video: &VideoResult, count: u32) -> Result<Quiz> {
        let prompt = format!(
            "Write a multiple-choice quiz with {count} questions for a learner studying \"{topic}\" \
             who just watched the video \"{title}\" ({url}). {description}\n\
             Respond with JSON only, shaped as \
             {{\"title\": string, \"questions\": [{{\"question\": string, \"options\": [string], \
             \"answerIndex\": number, \"explanation\": string}}]}}. \
             Give four options per question; answerIndex is zero-based.",
            count = count,
            topic = topic,
            title = video.title,
            url = video.url,
            description = if video.description.is_empty() {
                String::new()
            } else {
                format!("Video summary: {}", video.description)
            },
        );

        let request = CompletionRequest::new(prompt, &self.settings);
        let mut quiz: Quiz = complete_json(self.model.as_ref(), &request).await?;

        quiz.retain_answerable();
        quiz.questions.truncate(count as usize);
        if quiz.questions.is_empty() {
            return Err(Error::model(
                ModelErrorKind::Malformed,
                "Quiz has no answerable questions",
            ));
        }

        tracing::debug!("Generated quiz with {} questions", quiz.questions.len());
        Ok(quiz)
    }

    /// Ordered learning path for `topic`, at most `steps` steps, without videos
    pub async fn learning_path(&self, topic: &str, steps: u32) -> Result<LearningPath> {
        let prompt = format!(
            "Design a learning path of {steps} steps for someone who wants to learn \"{topic}\", \
             ordered from fundamentals to advanced material. For each step give a short title, \
             a one-sentence description and a YouTube search query that finds a good video for it. \
             Respond with JSON only, shaped as \
             {{\"steps\": [{{\"title\": string, \"description\": string, \"searchQuery\": string}}]}}.",
            steps = steps,
            topic = topic,
        );

        let request = CompletionRequest::new(prompt, &self.settings);
        let draft: PathDraft = complete_json(self.model.as_ref(), &request).await?;

        let steps: Vec<LearningStep> = draft
            .steps
            .into_iter()
            .filter(|step| !step.title.trim().is_empty())
            .map(|mut step| {
                if step.search_query.trim().is_empty() {
                    step.search_query = format!("{} {}", topic, step.title);
                }
                step.video = None;
                step
            })
            .take(steps as usize)
            .collect();

        if steps.is_empty() {
            return Err(Error::model(
                ModelErrorKind::Malformed,
                "Learning path has no steps",
            ));
        }

        Ok(LearningPath {
            topic: topic.to_string(),
            steps,
            generated_at: chrono::Utc::now(),
        })
    }
}
