//! Configuration management for the gateway
//!
//! This module handles loading and managing configuration settings
//! for both HTTP server and one-shot search modes.

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::{
    BrowserSettings, GuardSettings, LlmSettings, LoggingSettings, ServerSettings, Settings,
};
