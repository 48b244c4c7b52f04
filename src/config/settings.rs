//! Configuration settings structure
//!
//! Defines the main settings structure and loading logic for the gateway.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration settings for the gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server configuration
    pub server: ServerSettings,
    /// Session guard retry configuration
    pub guard: GuardSettings,
    /// Headless browser configuration
    pub browser: BrowserSettings,
    /// Language-model service configuration
    pub llm: LlmSettings,
    /// Logging configuration
    pub logging: LoggingSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server host address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Session guard retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardSettings {
    /// Maximum browser initialization attempts per round
    pub max_init_attempts: u32,
    /// Unit of the exponential initialization backoff in milliseconds
    pub init_backoff_unit_ms: u64,
    /// Upper bound of a single initialization backoff in seconds
    pub max_init_backoff_secs: u64,
    /// Default retry budget for wrapped operations
    pub operation_retries: u32,
    /// Step of the linear operation backoff in milliseconds
    pub operation_backoff_ms: u64,
}

/// Headless browser configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run Chromium without a window
    pub headless: bool,
    /// Explicit Chromium executable, otherwise auto-detected
    pub executable: Option<String>,
    /// User agent override
    pub user_agent: Option<String>,
    /// Base URL of the video search page
    pub search_url: String,
    /// Navigation deadline in seconds
    pub navigation_timeout_secs: u64,
    /// Extra wait after navigation for late content, in milliseconds
    pub settle_ms: u64,
}

/// Language-model service configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of the OpenAI-compatible API
    pub api_base: String,
    /// API key; model-backed endpoints are disabled without it
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Completion token limit
    pub max_tokens: u32,
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level or filter directive
    pub level: String,
    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "::".to_string(),
            port: 4417,
            timeout_secs: 120,
        }
    }
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            max_init_attempts: 3,
            init_backoff_unit_ms: 1000,
            max_init_backoff_secs: 30,
            operation_retries: 2,
            operation_backoff_ms: 2000,
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            user_agent: None,
            search_url: "https://www.google.com/search".to_string(),
            navigation_timeout_secs: 30,
            settle_ms: 1500,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            verbose: false,
        }
    }
}

impl ServerSettings {
    /// Request timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl BrowserSettings {
    /// Navigation deadline as a duration
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    /// Post-navigation wait as a duration
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Settings {
    /// Create new settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file; missing sections keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Load settings from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        Self::default().merge_with_env()
    }

    /// Apply environment variable overrides
    pub fn merge_with_env(mut self) -> Result<Self> {
        if let Ok(host) = std::env::var("VIDPATH_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("VIDPATH_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| Error::config(format!("Invalid port: {}", e)))?;
        }

        if let Ok(attempts) = std::env::var("VIDPATH_INIT_ATTEMPTS") {
            self.guard.max_init_attempts = attempts
                .parse()
                .map_err(|e| Error::config(format!("Invalid init attempts: {}", e)))?;
        }

        if let Ok(retries) = std::env::var("VIDPATH_OPERATION_RETRIES") {
            self.guard.operation_retries = retries
                .parse()
                .map_err(|e| Error::config(format!("Invalid operation retries: {}", e)))?;
        }

        if let Ok(headless) = std::env::var("VIDPATH_HEADLESS") {
            self.browser.headless = parse_bool(&headless)
                .ok_or_else(|| Error::config(format!("Invalid headless flag: {}", headless)))?;
        }

        if let Ok(path) = std::env::var("CHROME_PATH") {
            self.browser.executable = Some(path);
        }

        if let Ok(key) = std::env::var("OPENAI_API_KEY")
            && !key.trim().is_empty()
        {
            self.llm.api_key = Some(key);
        }

        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            self.llm.model = model;
        }

        if let Ok(base) = std::env::var("OPENAI_BASE_URL") {
            self.llm.api_base = base;
        }

        if let Ok(level) = std::env::var("VIDPATH_LOG") {
            self.logging.level = level;
        }

        Ok(self)
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(Error::config("Server host must not be empty"));
        }
        if self.guard.max_init_attempts == 0 {
            return Err(Error::config("max_init_attempts must be at least 1"));
        }
        if self.guard.init_backoff_unit_ms == 0 {
            return Err(Error::config("init_backoff_unit_ms must be positive"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::config(format!(
                "temperature must be within 0..=2, got {}",
                self.llm.temperature
            )));
        }
        url::Url::parse(&self.browser.search_url)
            .map_err(|e| Error::config(format!("Invalid search_url: {}", e)))?;
        url::Url::parse(&self.llm.api_base)
            .map_err(|e| Error::config(format!("Invalid api_base: {}", e)))?;
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.host, "::");
        assert_eq!(settings.server.port, 4417);
        assert_eq!(settings.guard.max_init_attempts, 3);
        assert_eq!(settings.guard.operation_retries, 2);
        assert_eq!(settings.guard.operation_backoff_ms, 2000);
        assert!(settings.browser.headless);
        assert!(settings.llm.api_key.is_none());
    }

    #[test]
    fn test_defaults_validate() {
        assert!(Settings::new().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[guard]
max_init_attempts = 5
"#,
        )
        .unwrap();
        assert_eq!(settings.guard.max_init_attempts, 5);
        assert_eq!(settings.guard.operation_retries, 2);
        assert_eq!(settings.server.port, 4417);
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut settings = Settings::default();
        settings.guard.max_init_attempts = 0;
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut settings = Settings::default();
        settings.llm.temperature = 3.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_debug_hides_api_key() {
        let llm = LlmSettings {
            api_key: Some("sk-secret".to_string()),
            ..LlmSettings::default()
        };
        let debug = format!("{:?}", llm);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
