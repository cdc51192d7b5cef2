//! Structured and free-text completion modes
//!
//! [`LlmGateway`] wraps a provider with the token budget and the JSON
//! recovery cascade. Structured calls never fail on malformed content:
//! anything that cannot be parsed into the target type becomes that
//! type's `Default`. Only provider-level failures (throttling,
//! transport) propagate, so callers can apply retry policy to them.

use crate::budget::TokenBudget;
use crate::json::recover_json;
use serde::de::DeserializeOwned;
use tracing::warn;
use trestle_domain::{ChatMessage, CompletionOptions, LlmError, LlmProvider};

/// Sampling temperature for structured extraction.
pub const DEFAULT_STRUCTURED_TEMPERATURE: f32 = 0.1;

/// Sampling temperature for free-text generation.
pub const DEFAULT_TEXT_TEMPERATURE: f32 = 0.7;

/// Default output ceiling for structured extraction.
pub const DEFAULT_STRUCTURED_OUTPUT_TOKENS: usize = 2_000;

/// Default output ceiling for free-text generation.
pub const DEFAULT_TEXT_OUTPUT_TOKENS: usize = 1_000;

/// Floor applied when clamping requested output tokens.
pub const MIN_OUTPUT_TOKENS: usize = 100;

/// Gateway between the pipeline and an [`LlmProvider`].
#[derive(Debug)]
pub struct LlmGateway<P: LlmProvider> {
    provider: P,
    budget: TokenBudget,
}

impl<P: LlmProvider> LlmGateway<P> {
    /// Wrap a provider, deriving the input budget from its limits.
    pub fn new(provider: P) -> Self {
        let budget = TokenBudget::new(provider.context_length(), provider.max_output_tokens());
        Self { provider, budget }
    }

    /// Access the wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Default options for structured calls.
    pub fn structured_options() -> CompletionOptions {
        CompletionOptions {
            temperature: DEFAULT_STRUCTURED_TEMPERATURE,
            max_output_tokens: DEFAULT_STRUCTURED_OUTPUT_TOKENS,
        }
    }

    /// Default options for free-text calls.
    pub fn text_options() -> CompletionOptions {
        CompletionOptions {
            temperature: DEFAULT_TEXT_TEMPERATURE,
            max_output_tokens: DEFAULT_TEXT_OUTPUT_TOKENS,
        }
    }

    fn clamp_options(&self, options: CompletionOptions) -> CompletionOptions {
        let ceiling = self.provider.max_output_tokens();
        CompletionOptions {
            temperature: options.temperature,
            max_output_tokens: options.max_output_tokens.max(MIN_OUTPUT_TOKENS).min(ceiling),
        }
    }

    /// Request a completion constrained to the given JSON schema and
    /// deserialize it into `T`.
    ///
    /// A strict-JSON system instruction carrying `schema` is prepended
    /// and the message list is fitted to the input budget. Content the
    /// model returns that cannot be recovered as JSON, or that does not
    /// match `T`, yields `T::default()`; only provider errors are
    /// returned as `Err`.
    pub async fn structured<T>(
        &self,
        messages: Vec<ChatMessage>,
        schema: &str,
        options: CompletionOptions,
    ) -> Result<T, LlmError>
    where
        T: DeserializeOwned + Default,
    {
        let instruction = ChatMessage::system(format!(
            "You are a precise data extraction engine. Respond with a single JSON \
             object and nothing else: no prose, no markdown fences, no commentary. \
             The object must conform exactly to this schema:\n{schema}"
        ));
        let mut full = Vec::with_capacity(messages.len() + 1);
        full.push(instruction);
        full.extend(messages);

        let fitted = self.budget.fit_messages(full);
        let content = self.provider.chat(&fitted, &self.clamp_options(options)).await?;

        let Some(value) = recover_json(&content) else {
            warn!(
                content_len = content.len(),
                "no JSON recoverable from model output, using empty result"
            );
            return Ok(T::default());
        };
        match serde_json::from_value(value) {
            Ok(parsed) => Ok(parsed),
            Err(e) => {
                warn!(error = %e, "recovered JSON did not match target shape, using empty result");
                Ok(T::default())
            }
        }
    }

    /// Request a free-text completion.
    pub async fn free_text(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<String, LlmError> {
        let fitted = self.budget.fit_messages(messages);
        self.provider.chat(&fitted, &self.clamp_options(options)).await
    }
}
