//! Trestle LLM Gateway Layer
//!
//! Everything between the pipeline and the language model:
//!
//! - [`DeepSeekProvider`]: OpenAI-compatible chat completions over HTTP,
//!   with failures classified into [`trestle_domain::LlmErrorKind`]
//! - [`TokenBudget`]: token counting and input truncation so requests
//!   never exceed the model's context window
//! - [`LlmGateway`]: structured (schema-constrained JSON) and free-text
//!   completion modes, including recovery from malformed JSON
//! - [`MockProvider`]: deterministic provider for tests
//!
//! # Example
//!
//! ```
//! use trestle_llm::MockProvider;
//! use trestle_domain::{ChatMessage, CompletionOptions, LlmProvider};
//!
//! # async fn example() {
//! let provider = MockProvider::new(r#"{"summary": "hi"}"#);
//! let options = CompletionOptions { temperature: 0.1, max_output_tokens: 2000 };
//! let content = provider.chat(&[ChatMessage::user("test")], &options).await.unwrap();
//! assert_eq!(content, r#"{"summary": "hi"}"#);
//! # }
//! ```

#![warn(missing_docs)]

pub mod budget;
pub mod deepseek;
pub mod gateway;
pub mod json;

pub use budget::TokenBudget;
pub use deepseek::{DeepSeekProvider, LlmConfig};
pub use gateway::LlmGateway;

use std::collections::VecDeque;
use std::sync::Mutex;
use trestle_domain::{ChatMessage, CompletionOptions, LlmError, LlmProvider};

/// Mock LLM provider for deterministic testing.
///
/// Returns scripted responses (or errors) in order, falling back to a
/// fixed default, without any network calls.
#[derive(Debug)]
pub struct MockProvider {
    default_response: String,
    scripted: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: Mutex<usize>,
    last_messages: Mutex<Vec<ChatMessage>>,
    context_length: usize,
    max_output_tokens: usize,
}

impl MockProvider {
    /// Create a provider that answers every request with `response`.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            scripted: Mutex::new(VecDeque::new()),
            calls: Mutex::new(0),
            last_messages: Mutex::new(Vec::new()),
            context_length: deepseek::MAX_CONTEXT_LENGTH,
            max_output_tokens: deepseek::MAX_OUTPUT_TOKENS,
        }
    }

    /// Override the advertised model limits.
    pub fn with_limits(mut self, context_length: usize, max_output_tokens: usize) -> Self {
        self.context_length = context_length;
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Queue a response consumed before the default kicks in.
    pub fn push_response(&self, response: impl Into<String>) {
        self.scripted.lock().unwrap().push_back(Ok(response.into()));
    }

    /// Queue an error consumed before the default kicks in.
    pub fn push_error(&self, error: LlmError) {
        self.scripted.lock().unwrap().push_back(Err(error));
    }

    /// Number of chat calls made so far.
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    /// Messages from the most recent chat call.
    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.last_messages.lock().unwrap().clone()
    }
}

impl LlmProvider for MockProvider {
    fn context_length(&self) -> usize {
        self.context_length
    }

    fn max_output_tokens(&self) -> usize {
        self.max_output_tokens
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        _options: &CompletionOptions,
    ) -> Result<String, LlmError> {
        *self.calls.lock().unwrap() += 1;
        *self.last_messages.lock().unwrap() = messages.to_vec();

        if let Some(scripted) = self.scripted.lock().unwrap().pop_front() {
            return scripted;
        }
        Ok(self.default_response.clone())
    }
}
