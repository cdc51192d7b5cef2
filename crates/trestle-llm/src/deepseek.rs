//! DeepSeek chat-completions provider
//!
//! Speaks the OpenAI-compatible `/chat/completions` endpoint and maps
//! HTTP and body-level failures onto [`LlmErrorKind`] so the pipeline
//! can tell transient throttling from permanent errors.

use serde::{Deserialize, Serialize};
use tracing::debug;
use trestle_domain::{ChatMessage, CompletionOptions, LlmError, LlmErrorKind, LlmProvider};

/// Context window of the deepseek-chat model, in tokens.
pub const MAX_CONTEXT_LENGTH: usize = 32_768;

/// Output ceiling of the deepseek-chat model, in tokens.
pub const MAX_OUTPUT_TOKENS: usize = 8_192;

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Provider configuration, normally read from the environment.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API key sent as a bearer token
    pub api_key: String,
    /// Model identifier
    pub model: String,
    /// Endpoint base URL, without the trailing `/chat/completions`
    pub base_url: String,
}

impl LlmConfig {
    /// Build a config with default model and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Read configuration from the environment.
    ///
    /// `DEEPSEEK_API_KEY` is required; `DEEPSEEK_MODEL` and
    /// `DEEPSEEK_BASE_URL` override the defaults.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = std::env::var("DEEPSEEK_API_KEY").map_err(|_| {
            LlmError::new(LlmErrorKind::Config, "DEEPSEEK_API_KEY is not set")
        })?;
        let mut config = Self::new(api_key);
        if let Ok(model) = std::env::var("DEEPSEEK_MODEL") {
            config.model = model;
        }
        if let Ok(base_url) = std::env::var("DEEPSEEK_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// DeepSeek provider over HTTP.
#[derive(Debug)]
pub struct DeepSeekProvider {
    client: reqwest::Client,
    config: LlmConfig,
}

impl DeepSeekProvider {
    /// Create a provider from the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::new(LlmErrorKind::Config, "empty API key"));
        }
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| LlmError::transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Create a provider configured from the environment.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::new(LlmConfig::from_env()?)
    }

    fn classify_failure(status: reqwest::StatusCode, body: &str) -> LlmError {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || body.to_lowercase().contains("rate limit")
        {
            return LlmError::rate_limited(format!("HTTP {status}: {body}"));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return LlmError::new(
                LlmErrorKind::ModelNotAvailable,
                format!("HTTP {status}: {body}"),
            );
        }
        LlmError::transport(format!("HTTP {status}: {body}"))
    }
}

impl LlmProvider for DeepSeekProvider {
    fn context_length(&self) -> usize {
        MAX_CONTEXT_LENGTH
    }

    fn max_output_tokens(&self) -> usize {
        MAX_OUTPUT_TOKENS
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(|m| WireMessage { role: m.role.as_str(), content: &m.content })
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_output_tokens,
        };

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        debug!(model = %self.config.model, messages = messages.len(), "chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::transport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_failure(status, &body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::invalid_response(format!("unreadable response body: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::invalid_response("response contained no choices"))
    }
}
