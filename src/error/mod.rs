//! Error handling for the gateway
//!
//! This module defines error types and handling patterns used throughout the application.

pub mod types;

pub use types::{AcquisitionError, Error, ModelErrorKind, Result, ScrapeErrorKind};
