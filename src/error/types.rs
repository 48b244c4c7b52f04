//! Error type definitions
//!
//! Defines the main error types used throughout the gateway. Failures coming
//! out of the scrape engine and the language-model service carry a closed
//! kind so callers can switch on it instead of matching message text.

use std::fmt;
use thiserror::Error;

/// Kind of failure reported by a scrape engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeErrorKind {
    /// Navigation or script evaluation exceeded its deadline
    Timeout,
    /// The search page served a bot-detection interstitial
    Blocked,
    /// The page could not be opened or navigated
    Navigation,
    /// The page loaded but its result payload could not be read
    Extraction,
    /// The search produced no usable video
    NoResults,
    /// The browser process failed to launch or crashed
    Browser,
    /// An operation ran before the engine was initialized
    NotInitialized,
}

impl fmt::Display for ScrapeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Timeout => "timeout",
            Self::Blocked => "blocked",
            Self::Navigation => "navigation",
            Self::Extraction => "extraction",
            Self::NoResults => "no results",
            Self::Browser => "browser",
            Self::NotInitialized => "not initialized",
        };
        f.write_str(name)
    }
}

/// Kind of failure reported by the language-model service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelErrorKind {
    /// No API key was configured
    NotConfigured,
    /// The API rejected the credentials
    Unauthorized,
    /// The API asked us to slow down
    RateLimited,
    /// Any other non-success status from the API
    Upstream,
    /// The API answered but the completion was missing or unreadable
    Malformed,
}

impl fmt::Display for ModelErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotConfigured => "not configured",
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate limited",
            Self::Upstream => "upstream",
            Self::Malformed => "malformed",
        };
        f.write_str(name)
    }
}

/// Terminal failure of one initialization round
///
/// Cloned to every caller that waited on the same round.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Session initialization failed after {attempts} attempts: {last_error}")]
pub struct AcquisitionError {
    /// Number of acquisition calls made in the round
    pub attempts: u32,
    /// Message of the last underlying failure
    pub last_error: String,
}

/// Main error type for the gateway
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),

    /// Request did not finish within the server deadline
    #[error("Request exceeded the {secs}s deadline")]
    RequestTimeout { secs: u64 },

    /// Request validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Browser session could not be acquired
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    /// Wrapped operation ran out of retries
    #[error("{label} failed after all retry attempts")]
    OperationExhausted {
        label: String,
        #[source]
        source: Box<Error>,
    },

    /// Wrapped operation returned no usable data
    #[error("{label} returned empty result")]
    EmptyResult { label: String },

    /// Scrape engine errors
    #[error("Scrape error ({kind}): {message}")]
    Scrape {
        kind: ScrapeErrorKind,
        message: String,
    },

    /// Language-model service errors
    #[error("Language model error ({kind}): {message}")]
    LanguageModel {
        kind: ModelErrorKind,
        message: String,
    },

    /// No well-formed JSON in model output
    #[error("No JSON found: {reason}")]
    NoJsonFound { reason: String },

    /// Network/HTTP client errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new server error
    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an exhaustion error wrapping the last failure
    pub fn exhausted(label: impl Into<String>, source: Error) -> Self {
        Self::OperationExhausted {
            label: label.into(),
            source: Box::new(source),
        }
    }

    /// Create an empty-result error
    pub fn empty_result(label: impl Into<String>) -> Self {
        Self::EmptyResult {
            label: label.into(),
        }
    }

    /// Create a scrape engine error
    pub fn scrape(kind: ScrapeErrorKind, message: impl Into<String>) -> Self {
        Self::Scrape {
            kind,
            message: message.into(),
        }
    }

    /// Create a language-model error
    pub fn model(kind: ModelErrorKind, message: impl Into<String>) -> Self {
        Self::LanguageModel {
            kind,
            message: message.into(),
        }
    }

    /// Create a structured-extraction error
    pub fn no_json(reason: impl Into<String>) -> Self {
        Self::NoJsonFound {
            reason: reason.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the failure means "nothing matched", even after retries
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Scrape {
                kind: ScrapeErrorKind::NoResults,
                ..
            }
            | Self::EmptyResult { .. } => true,
            Self::OperationExhausted { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// Whether a client may succeed by retrying the whole request later
    pub fn is_retryable(&self) -> bool {
        if self.is_not_found() {
            return false;
        }
        match self {
            Self::Acquisition(_) | Self::OperationExhausted { .. } | Self::RequestTimeout { .. } => {
                true
            }
            Self::Scrape { kind, .. } => matches!(
                kind,
                ScrapeErrorKind::Timeout
                    | ScrapeErrorKind::Blocked
                    | ScrapeErrorKind::Navigation
                    | ScrapeErrorKind::Browser
                    | ScrapeErrorKind::NotInitialized
            ),
            Self::LanguageModel { kind, .. } => {
                matches!(kind, ModelErrorKind::RateLimited | ModelErrorKind::Upstream)
            }
            Self::Network(_) => true,
            _ => false,
        }
    }
}
