//! Configuration management for delve
//!
//! Settings are loaded from environment variables with fallback defaults.
//! Command-line flags override them afterwards.
//!
//! # Environment Variables
//!
//! ## Delve Configuration
//! - `DELVE_PROVIDER`: Provider selection (ollama|openai|anthropic|gemini|xai|groq) - default: "ollama"
//! - `DELVE_MODEL`: Model name - default: "qwen2.5-coder:14b"
//! - `DELVE_API_BASE_URL`: Custom endpoint for the selected provider
//! - `DELVE_REQUEST_TIMEOUT`: Per generation call, seconds - default: "120"
//! - `DELVE_SEARCH_TIMEOUT`: Per search call, seconds - default: "30"
//! - `DELVE_RUN_DEADLINE`: Whole research run, seconds - default: "600"
//! - `DELVE_LOG_LEVEL`: Logging level - default: "info"
//!
//! ## Collaborator Credentials
//! - `TAVILY_API_KEY`: Web search API key
//! - Provider keys are read by the genai library (`OPENAI_API_KEY`,
//!   `ANTHROPIC_API_KEY`, `GEMINI_API_KEY`, ...)
//!
//! # Example
//!
//! ```no_run
//! use delve::DelveConfig;
//!
//! let config = DelveConfig::default();
//! config.validate().expect("Invalid configuration");
//! println!("{}", config);
//! ```

use genai::adapter::AdapterKind;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MODEL: &str = "qwen2.5-coder:14b";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RUN_DEADLINE_SECS: u64 = 600;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid provider name
    #[error("Invalid provider: {0}. Valid options: ollama, openai, anthropic, gemini, xai, groq")]
    InvalidProvider(String),

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Parses a provider name as accepted by `DELVE_PROVIDER` and `--backend`
pub fn parse_provider(name: &str) -> Result<AdapterKind, ConfigError> {
    match name.to_lowercase().as_str() {
        "ollama" => Ok(AdapterKind::Ollama),
        "openai" => Ok(AdapterKind::OpenAI),
        "anthropic" | "claude" => Ok(AdapterKind::Anthropic),
        "gemini" => Ok(AdapterKind::Gemini),
        "xai" | "grok" => Ok(AdapterKind::Xai),
        "groq" => Ok(AdapterKind::Groq),
        other => Err(ConfigError::InvalidProvider(other.to_string())),
    }
}

/// Main configuration structure for delve
#[derive(Debug, Clone)]
pub struct DelveConfig {
    /// Text generation provider (from genai)
    pub provider: AdapterKind,

    /// Model name (provider-specific)
    pub model: String,

    /// Custom endpoint for the provider
    pub api_base_url: Option<String>,

    /// Per generation call timeout in seconds
    pub request_timeout_secs: u64,

    /// Per search call timeout in seconds
    pub search_timeout_secs: u64,

    /// Whole run deadline in seconds
    pub run_deadline_secs: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Web search API key
    pub tavily_api_key: Option<String>,
}

impl Default for DelveConfig {
    /// Loads from `DELVE_*` environment variables with defaults
    fn default() -> Self {
        let provider = env::var("DELVE_PROVIDER")
            .ok()
            .and_then(|s| parse_provider(&s).ok())
            .unwrap_or(AdapterKind::Ollama);

        let model = env::var("DELVE_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_base_url = env::var(crate::llm::API_BASE_URL_ENV)
            .ok()
            .filter(|u| !u.trim().is_empty());

        let request_timeout_secs = env_u64("DELVE_REQUEST_TIMEOUT", DEFAULT_REQUEST_TIMEOUT_SECS);
        let search_timeout_secs = env_u64("DELVE_SEARCH_TIMEOUT", DEFAULT_SEARCH_TIMEOUT_SECS);
        let run_deadline_secs = env_u64("DELVE_RUN_DEADLINE", DEFAULT_RUN_DEADLINE_SECS);

        let log_level = env::var("DELVE_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        let tavily_api_key = env::var("TAVILY_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        Self {
            provider,
            model,
            api_base_url,
            request_timeout_secs,
            search_timeout_secs,
            run_deadline_secs,
            log_level,
            tavily_api_key,
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn check_secs(name: &str, value: u64, max: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::ValidationFailed(format!(
            "{} must be at least 1 second",
            name
        )));
    }
    if value > max {
        return Err(ConfigError::ValidationFailed(format!(
            "{} cannot exceed {} seconds",
            name, max
        )));
    }
    Ok(())
}

impl DelveConfig {
    /// Validates numeric ranges and the log level.
    ///
    /// Provider credentials are checked when the client is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_secs("Request timeout", self.request_timeout_secs, 600)?;
        check_secs("Search timeout", self.search_timeout_secs, 600)?;
        check_secs("Run deadline", self.run_deadline_secs, 3600)?;

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Model name must not be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn run_deadline(&self) -> Duration {
        Duration::from_secs(self.run_deadline_secs)
    }

    /// Converts configuration to a display map for output formatting.
    /// Secrets are reported as set/unset only.
    pub fn to_display_map(&self) -> std::collections::HashMap<String, String> {
        let mut map = std::collections::HashMap::new();

        map.insert("provider".to_string(), self.provider.as_str().to_string());
        map.insert("model".to_string(), self.model.clone());
        if let Some(ref url) = self.api_base_url {
            map.insert("api_base_url".to_string(), url.clone());
        }
        map.insert(
            "request_timeout_secs".to_string(),
            self.request_timeout_secs.to_string(),
        );
        map.insert(
            "search_timeout_secs".to_string(),
            self.search_timeout_secs.to_string(),
        );
        map.insert(
            "run_deadline_secs".to_string(),
            self.run_deadline_secs.to_string(),
        );
        map.insert("log_level".to_string(), self.log_level.clone());
        map.insert(
            "tavily_api_key".to_string(),
            if self.tavily_api_key.is_some() {
                "set".to_string()
            } else {
                "unset".to_string()
            },
        );

        map
    }
}

impl fmt::Display for DelveConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Delve Configuration:")?;
        writeln!(f, "  Provider: {}", self.provider.as_str())?;
        writeln!(f, "  Model: {}", self.model)?;
        if let Some(ref url) = self.api_base_url {
            writeln!(f, "  API Base URL: {}", url)?;
        }
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Search Timeout: {}s", self.search_timeout_secs)?;
        writeln!(f, "  Run Deadline: {}s", self.run_deadline_secs)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        writeln!(
            f,
            "  Tavily API Key: {}",
            if self.tavily_api_key.is_some() {
                "set"
            } else {
                "unset"
            }
        )?;
        Ok(())
    }
}
