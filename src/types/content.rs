//! Model-generated learning content
//!
//! Shapes the language model is asked to produce. Decoding is lenient about
//! missing optional fields but strict about the ones a client needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::VideoResult;

/// Multiple-choice quiz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    /// Quiz title
    pub title: String,

    /// Questions in order
    pub questions: Vec<QuizQuestion>,
}

/// One multiple-choice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    /// Question text
    pub question: String,

    /// Answer options
    pub options: Vec<String>,

    /// Index of the correct option
    pub answer_index: usize,

    /// Why the answer is correct
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Quiz {
    /// Drop questions whose answer index does not point at an option
    pub fn retain_answerable(&mut self) {
        self.questions
            .retain(|q| !q.options.is_empty() && q.answer_index < q.options.len());
    }
}

/// Quiz together with the video it was written for
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResponse {
    /// Video the quiz is about
    pub video: VideoResult,

    /// Generated quiz
    pub quiz: Quiz,
}

/// Ordered plan for learning a topic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
    /// Topic being learned
    pub topic: String,

    /// Steps in order
    pub steps: Vec<LearningStep>,

    /// When the model produced the plan
    pub generated_at: DateTime<Utc>,
}

/// One step of a learning path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStep {
    /// Step title
    pub title: String,

    /// What the learner should take away
    #[serde(default)]
    pub description: String,

    /// Query used to find a video for this step
    #[serde(default)]
    pub search_query: String,

    /// Video found for the step
    #[serde(default)]
    pub video: Option<VideoResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiz_decodes_camel_case() {
        let quiz: Quiz = serde_json::from_str(
            r#"{"title":"Ownership","questions":[
                {"question":"Who owns a value?","options":["one owner","many"],"answerIndex":0}
            ]}"#,
        )
        .unwrap();
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].answer_index, 0);
        assert!(quiz.questions[0].explanation.is_none());
    }

    #[test]
    fn test_retain_answerable() {
        let mut quiz = Quiz {
            title: "t".to_string(),
            questions: vec![
                QuizQuestion {
                    question: "ok".to_string(),
                    options: vec!["a".to_string(), "b".to_string()],
                    answer_index: 1,
                    explanation: None,
                },
                QuizQuestion {
                    question: "bad index".to_string(),
                    options: vec!["a".to_string()],
                    answer_index: 3,
                    explanation: None,
                },
            ],
        };
        quiz.retain_answerable();
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].question, "ok");
    }

    #[test]
    fn test_learning_step_video_defaults_to_none() {
        let step: LearningStep = serde_json::from_str(
            r#"{"title":"Basics","searchQuery":"rust basics tutorial"}"#,
        )
        .unwrap();
        assert!(step.video.is_none());
        assert!(step.description.is_empty());
    }
}
