//! Configuration module for the minutes backend.
//!
//! All configuration is loaded from environment variables (and an optional `.env` file)
//! with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Error raised when an environment variable holds an unusable value.
#[derive(Debug, thiserror::Error)]
#[error("invalid value for {var}: {reason}")]
pub struct ConfigError {
    pub var: &'static str,
    pub reason: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Service name reported in logs
    pub app_name: String,
    /// Version reported by the health endpoint
    pub app_version: String,
    /// Debug mode; lowers the default log level to `debug`
    pub debug: bool,
    /// API key for the chat-completion provider
    pub openai_api_key: Option<String>,
    /// Model used for minutes generation
    pub openai_model: String,
    /// Base URL of the OpenAI-compatible API
    pub openai_base_url: String,
    /// Upper bound on completion tokens per request
    pub max_tokens: u32,
    /// Maximum accepted length of raw notes, in characters
    pub max_input_length: usize,
    /// Attempts made against the provider before giving up
    pub llm_max_retries: u32,
    /// Per-request timeout for provider calls
    pub llm_timeout: Duration,
    /// Pre-shared key protecting the generation endpoint (optional)
    pub api_psk: Option<String>,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Meeting Minutes API".to_string(),
            app_version: "1.0.0".to_string(),
            debug: false,
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            max_tokens: 2000,
            max_input_length: 50_000,
            llm_max_retries: 3,
            llm_timeout: Duration::from_secs(60),
            api_psk: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let debug = parse_var("DEBUG", defaults.debug, parse_bool)?;

        let log_level = env::var("LOG_LEVEL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.to_lowercase())
            .unwrap_or_else(|| {
                if debug {
                    "debug".to_string()
                } else {
                    defaults.log_level.clone()
                }
            });

        Ok(Self {
            app_name: env::var("APP_NAME").unwrap_or(defaults.app_name),
            app_version: env::var("APP_VERSION").unwrap_or(defaults.app_version),
            debug,
            openai_api_key: non_empty_var("OPENAI_API_KEY"),
            openai_model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            max_tokens: parse_var("MAX_TOKENS", defaults.max_tokens, parse_from_str)?,
            max_input_length: parse_var(
                "MAX_INPUT_LENGTH",
                defaults.max_input_length,
                parse_from_str,
            )?,
            llm_max_retries: parse_var("LLM_MAX_RETRIES", defaults.llm_max_retries, |s| {
                match parse_from_str::<u32>(s)? {
                    0 => Err("must be at least 1".to_string()),
                    n => Ok(n),
                }
            })?,
            llm_timeout: parse_var("LLM_TIMEOUT_SECS", defaults.llm_timeout, |s| {
                parse_from_str::<u64>(s).map(Duration::from_secs)
            })?,
            api_psk: non_empty_var("API_PSK"),
            bind_addr: parse_var("BIND_ADDR", defaults.bind_addr, parse_from_str)?,
            log_level,
        })
    }
}

fn non_empty_var(var: &str) -> Option<String> {
    env::var(var).ok().filter(|s| !s.trim().is_empty())
}

fn parse_var<T>(
    var: &'static str,
    default: T,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => {
            parse(raw.trim()).map_err(|reason| ConfigError { var, reason })
        }
        _ => Ok(default),
    }
}

fn parse_from_str<T>(s: &str) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    s.parse::<T>().map_err(|e| e.to_string())
}

fn parse_bool(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected a boolean, got {other:?}")),
    }
}
