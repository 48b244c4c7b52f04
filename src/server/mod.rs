//! HTTP server
//!
//! Axum router, shared state and endpoint handlers.

pub mod app;
pub mod handlers;

pub use app::{AppState, create_app};
