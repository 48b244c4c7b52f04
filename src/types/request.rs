//! Request type definitions
//!
//! Defines the JSON bodies accepted by the HTTP endpoints and their validation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default number of search results
pub const DEFAULT_SEARCH_LIMIT: usize = 10;
/// Largest accepted search limit
pub const MAX_SEARCH_LIMIT: usize = 50;
/// Default number of quiz questions
pub const DEFAULT_QUESTION_COUNT: u32 = 5;
/// Largest accepted quiz size
pub const MAX_QUESTION_COUNT: u32 = 20;
/// Default number of learning path steps
pub const DEFAULT_PATH_STEPS: u32 = 5;
/// Largest accepted learning path
pub const MAX_PATH_STEPS: u32 = 10;

/// Request for a video search
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text search query
    pub query: String,

    /// Maximum number of results
    pub limit: Option<usize>,
}

/// Request for the single best video of a query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BestVideoRequest {
    /// Free-text search query
    pub query: String,
}

/// Request for a quiz about a topic
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    /// Topic of the quiz
    pub topic: String,

    /// Number of questions to generate
    pub question_count: Option<u32>,
}

/// Request for a learning path about a topic
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearningPathRequest {
    /// Topic to learn
    pub topic: String,

    /// Number of steps to generate
    pub steps: Option<u32>,
}

fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{} must not be empty", field)));
    }
    if trimmed.chars().count() > 500 {
        return Err(Error::validation(format!(
            "{} must be at most 500 characters",
            field
        )));
    }
    Ok(trimmed.to_string())
}

fn bounded<T>(field: &str, value: Option<T>, default: T, max: T) -> Result<T>
where
    T: PartialOrd + Copy + std::fmt::Display + From<u8>,
{
    let value = value.unwrap_or(default);
    if value < T::from(1) || value > max {
        return Err(Error::validation(format!(
            "{} must be between 1 and {}",
            field, max
        )));
    }
    Ok(value)
}

impl SearchRequest {
    /// Create a search request
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: None,
        }
    }

    /// Set result limit
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Validated `(query, limit)`
    pub fn validate(&self) -> Result<(String, usize)> {
        let query = require_text("query", &self.query)?;
        let limit = bounded("limit", self.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT)?;
        Ok((query, limit))
    }
}

impl BestVideoRequest {
    /// Create a best-video request
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }

    /// Validated query
    pub fn validate(&self) -> Result<String> {
        require_text("query", &self.query)
    }
}

impl QuizRequest {
    /// Create a quiz request
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            question_count: None,
        }
    }

    /// Set question count
    pub fn with_question_count(mut self, count: u32) -> Self {
        self.question_count = Some(count);
        self
    }

    /// Validated `(topic, question_count)`
    pub fn validate(&self) -> Result<(String, u32)> {
        let topic = require_text("topic", &self.topic)?;
        let count = bounded(
            "questionCount",
            self.question_count,
            DEFAULT_QUESTION_COUNT,
            MAX_QUESTION_COUNT,
        )?;
        Ok((topic, count))
    }
}

impl LearningPathRequest {
    /// Create a learning path request
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            steps: None,
        }
    }

    /// Set step count
    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = Some(steps);
        self
    }

    /// Validated `(topic, steps)`
    pub fn validate(&self) -> Result<(String, u32)> {
        let topic = require_text("topic", &self.topic)?;
        let steps = bounded("steps", self.steps, DEFAULT_PATH_STEPS, MAX_PATH_STEPS)?;
        Ok((topic, steps))
    }
}
