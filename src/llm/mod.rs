//! Language model gateway.
//!
//! Every call to the chat-completion provider goes through [`LanguageModel`]. Retry and
//! error handling live in the provider implementation; [`generate_json`] handles the
//! common "ask for JSON, parse what comes back" pattern on top of any implementation.

mod openai;

pub use openai::*;

use async_trait::async_trait;
use serde_json::{Map, Value};

/// How much of an unparseable reply is written to the log.
const RAW_REPLY_LOG_LIMIT: usize = 500;

/// Errors raised by the language model gateway.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("OPENAI_API_KEY is not set. Please add it to your environment or .env file.")]
    MissingApiKey,
    #[error("failed to build HTTP client: {0}")]
    Client(String),
    #[error("connection error: {0}")]
    Connection(String),
    #[error("provider API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("provider returned no message content")]
    EmptyResponse,
    #[error("all retry attempts exhausted")]
    RetriesExhausted,
    #[error("AI returned invalid JSON. This can happen occasionally. Please try again. Error: {reason}")]
    InvalidJson { reason: String },
    #[error("AI response has an unexpected structure: {0}")]
    InvalidShape(String),
}

/// A single system + user prompt exchange.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_message: String,
    pub prompt: String,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system_message: "You are a helpful assistant.".to_string(),
            prompt: prompt.into(),
            temperature: 0.3,
        }
    }

    pub fn with_system_message(mut self, system_message: impl Into<String>) -> Self {
        self.system_message = system_message.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Text reply from the model.
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub usage: TokenUsage,
}

/// A chat-completion backend.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier reported alongside generated output.
    fn model_name(&self) -> &str;

    /// Send the prompt and return the raw text reply.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError>;
}

/// Send a prompt and parse the reply as a JSON object.
pub async fn generate_json(
    model: &dyn LanguageModel,
    request: &CompletionRequest,
) -> Result<Map<String, Value>, LlmError> {
    let completion = model.complete(request).await?;
    parse_json_object(&completion.content)
}

/// Parse a model reply as a JSON object, tolerating a surrounding markdown code fence.
pub fn parse_json_object(raw: &str) -> Result<Map<String, Value>, LlmError> {
    let cleaned = strip_code_fence(raw);

    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(LlmError::InvalidShape(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
        Err(e) => {
            tracing::error!("Failed to parse AI response as JSON: {}", e);
            tracing::error!("Raw response was: {}", truncate_chars(raw, RAW_REPLY_LOG_LIMIT));
            Err(LlmError::InvalidJson {
                reason: e.to_string(),
            })
        }
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let mut cleaned = raw.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    cleaned.trim()
}

fn truncate_chars(s: &str, limit: usize) -> &str {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
