//! OpenAI-compatible chat-completion client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{Completion, CompletionRequest, LanguageModel, LlmError, TokenUsage};
use crate::config::Config;

/// Retry behavior for provider calls.
///
/// Rate-limited attempts back off exponentially from `rate_limit_base`; connection
/// failures wait a flat `connection_backoff`. Other provider errors are never retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub rate_limit_base: Duration,
    pub connection_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_base: Duration::from_secs(1),
            connection_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Delay before retrying after the given (1-based) rate-limited attempt: 1x, 2x, 4x...
    pub fn rate_limit_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.rate_limit_base.saturating_mul(1 << exponent)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorDetail,
}

#[derive(Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

/// Outcome of a single failed attempt, classified for the retry loop.
enum AttemptError {
    RateLimited,
    Connection(String),
    Fatal(LlmError),
}

/// Client for the `/chat/completions` endpoint of an OpenAI-compatible API.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl OpenAiClient {
    /// Build a client from configuration. Fails when no API key is configured.
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        let api_key = config
            .openai_api_key
            .clone()
            .ok_or(LlmError::MissingApiKey)?;

        let http = reqwest::Client::builder()
            .timeout(config.llm_timeout)
            .build()
            .map_err(|e| LlmError::Client(e.to_string()))?;

        tracing::info!("LLM service initialized with model: {}", config.openai_model);

        Ok(Self {
            http,
            api_key,
            endpoint: format!(
                "{}/chat/completions",
                config.openai_base_url.trim_end_matches('/')
            ),
            model: config.openai_model.clone(),
            max_tokens: config.max_tokens,
            retry: RetryPolicy {
                max_attempts: config.llm_max_retries.max(1),
                ..RetryPolicy::default()
            },
        })
    }

    #[cfg(test)]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn send_once(&self, body: &ChatRequest<'_>) -> Result<Completion, AttemptError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AttemptError::Connection(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AttemptError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ProviderErrorBody>(&text)
                .map(|b| b.error.message)
                .unwrap_or(text);
            return Err(AttemptError::Fatal(LlmError::Api {
                status: status.as_u16(),
                message,
            }));
        }

        // A stalled or dropped body is a transport failure; only a complete body that fails
        // to decode is a provider error.
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AttemptError::Connection(e.to_string()))?;
        let parsed: ChatResponse = serde_json::from_slice(&bytes).map_err(|e| {
            AttemptError::Fatal(LlmError::Api {
                status: status.as_u16(),
                message: format!("malformed response body: {e}"),
            })
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AttemptError::Fatal(LlmError::EmptyResponse))?;

        let usage = parsed.usage.unwrap_or_default();
        Ok(Completion {
            content,
            usage: TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            },
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(name = "llm_complete", skip_all)]
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system_message,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: self.max_tokens,
        };

        let max_attempts = self.retry.max_attempts;
        for attempt in 1..=max_attempts {
            tracing::info!(
                "Calling OpenAI (attempt {}/{}, model={}, temp={})",
                attempt,
                max_attempts,
                self.model,
                request.temperature
            );

            match self.send_once(&body).await {
                Ok(completion) => {
                    let usage = completion.usage;
                    tracing::info!(
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        total_tokens = usage.total_tokens,
                        "OpenAI response received"
                    );
                    return Ok(completion);
                }
                Err(AttemptError::RateLimited) => {
                    if attempt < max_attempts {
                        let wait = self.retry.rate_limit_delay(attempt);
                        tracing::warn!(
                            "Rate limited by OpenAI. Waiting {:?} before retry...",
                            wait
                        );
                        tokio::time::sleep(wait).await;
                    } else {
                        tracing::warn!("Rate limited by OpenAI on final attempt");
                    }
                }
                Err(AttemptError::Connection(message)) => {
                    tracing::error!("Connection error: {}", message);
                    if attempt < max_attempts {
                        tokio::time::sleep(self.retry.connection_backoff).await;
                    } else {
                        return Err(LlmError::Connection(message));
                    }
                }
                Err(AttemptError::Fatal(err)) => {
                    tracing::error!("OpenAI API error: {}", err);
                    return Err(err);
                }
            }
        }

        Err(LlmError::RetriesExhausted)
    }
}
