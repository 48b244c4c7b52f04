//! What counts as "no data" for a wrapped operation

use crate::types::{LearningPath, Quiz, VideoResult};

/// Payloads that can come back empty
///
/// An empty payload is retried exactly like an error.
pub trait EmptyCheck {
    /// Whether the value carries no usable data
    fn is_empty_result(&self) -> bool;
}

impl<T> EmptyCheck for Vec<T> {
    fn is_empty_result(&self) -> bool {
        self.is_empty()
    }
}

impl<T> EmptyCheck for Option<T> {
    fn is_empty_result(&self) -> bool {
        self.is_none()
    }
}

impl EmptyCheck for String {
    fn is_empty_result(&self) -> bool {
        self.trim().is_empty()
    }
}

impl EmptyCheck for () {
    fn is_empty_result(&self) -> bool {
        false
    }
}

impl EmptyCheck for VideoResult {
    fn is_empty_result(&self) -> bool {
        self.url.trim().is_empty()
    }
}

impl EmptyCheck for Quiz {
    fn is_empty_result(&self) -> bool {
        self.questions.is_empty()
    }
}

impl EmptyCheck for LearningPath {
    fn is_empty_result(&self) -> bool {
        self.steps.is_empty()
    }
}

impl EmptyCheck for serde_json::Value {
    fn is_empty_result(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Array(items) => items.is_empty(),
            Self::Object(fields) => fields.is_empty(),
            Self::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}
