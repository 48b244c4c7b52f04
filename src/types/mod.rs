//! Type definitions for the gateway
//!
//! This module contains the main data structures used for requests and responses.

pub mod content;
pub mod request;
pub mod response;
pub mod video;

pub use content::{LearningPath, LearningStep, Quiz, QuizQuestion, QuizResponse};
pub use request::{BestVideoRequest, LearningPathRequest, QuizRequest, SearchRequest};
pub use response::{ApiResponse, PingResponse};
pub use video::VideoResult;
