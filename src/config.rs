//! Client configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default backend content service.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:1337";

/// Default generative AI endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Models tried in order; later entries are used when earlier ones run out of quota.
pub const DEFAULT_GEMINI_MODELS: [&str; 3] =
    ["gemini-2.0-flash", "gemini-1.5-flash", "gemini-2.0-flash-lite"];

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend content service base URL (without the `/api` suffix)
    pub backend_url: String,
    /// Gemini API base URL
    pub gemini_base_url: String,
    /// Gemini API key; AI features are unavailable without one
    pub gemini_api_key: Option<String>,
    /// Gemini models in fallback order
    pub gemini_models: Vec<String>,
    /// Directory holding durable client storage
    pub state_dir: PathBuf,
    /// Per-request timeout for the HTTP client
    pub http_timeout: Duration,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            gemini_api_key: None,
            gemini_models: DEFAULT_GEMINI_MODELS.iter().map(|m| m.to_string()).collect(),
            state_dir: PathBuf::from(".fittrack"),
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let gemini_models = match env::var("GEMINI_MODELS") {
            Ok(raw) => {
                let models = parse_model_list(&raw);
                if models.is_empty() {
                    return Err(ConfigError::Invalid("GEMINI_MODELS", raw));
                }
                models
            }
            Err(_) => DEFAULT_GEMINI_MODELS.iter().map(|m| m.to_string()).collect(),
        };

        let http_timeout = match env::var("FITTRACK_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid("FITTRACK_HTTP_TIMEOUT_SECS", raw))?,
            Err(_) => Duration::from_secs(30),
        };

        Ok(Self {
            backend_url: env::var("FITTRACK_BACKEND_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            gemini_api_key: env::var("GEMINI_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            gemini_models,
            state_dir: env::var("FITTRACK_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".fittrack")),
            http_timeout,
        })
    }

    /// The Gemini API key, or an error explaining how to provide one.
    pub fn require_gemini_api_key(&self) -> Result<&str, ConfigError> {
        self.gemini_api_key
            .as_deref()
            .ok_or(ConfigError::Missing("GEMINI_API_KEY"))
    }
}

fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(String::from)
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_list_skips_blanks() {
        let models = parse_model_list(" gemini-2.0-flash, ,gemini-1.5-flash ,");
        assert_eq!(models, vec!["gemini-2.0-flash", "gemini-1.5-flash"]);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend_url, "http://localhost:1337");
        assert_eq!(config.gemini_models.len(), 3);
        assert_eq!(config.gemini_models[0], "gemini-2.0-flash");
        assert!(config.require_gemini_api_key().is_err());
    }

    #[test]
    fn test_require_gemini_api_key() {
        let config = Config {
            gemini_api_key: Some("abc".to_string()),
            ..Config::default()
        };
        assert_eq!(config.require_gemini_api_key().unwrap(), "abc");
    }
}
