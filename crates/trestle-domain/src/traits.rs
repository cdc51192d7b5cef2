//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and its two
//! pieces of infrastructure: the LLM provider and the graph store.
//! Implementations live in `trestle-llm` and `trestle-store`; the
//! orchestrator in `trestle-extractor` is generic over both.

use crate::extraction::{ExtractedEntity, ExtractedRelationship};
use crate::graph::{EntityMergeOutcome, GraphStats, NewEpisode};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// One chat message sent to or received from an LLM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Who the message is attributed to
    pub role: Role,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// Build a system-role message.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    /// Build a user-role message.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    /// Build an assistant-role message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Standing instructions; retained verbatim under truncation
    System,
    /// Caller content
    User,
    /// Model output
    Assistant,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Per-request completion parameters.
#[derive(Debug, Clone, Copy)]
pub struct CompletionOptions {
    /// Sampling temperature
    pub temperature: f32,
    /// Requested output token ceiling; the gateway clamps this to the
    /// provider's model ceiling before issuing the request
    pub max_output_tokens: usize,
}

/// Classification of an LLM failure.
///
/// The orchestrator's retry policy keys off this: `RateLimited` is
/// retried with backoff, everything else aborts the chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Provider-side throttling; transient, eligible for backoff retry
    RateLimited,
    /// Network or HTTP transport failure
    Transport,
    /// The configured model is not available at the endpoint
    ModelNotAvailable,
    /// Provider returned a response the client could not read
    InvalidResponse,
    /// Missing or invalid credentials/model configuration
    Config,
}

impl std::fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LlmErrorKind::RateLimited => "rate limited",
            LlmErrorKind::Transport => "transport",
            LlmErrorKind::ModelNotAvailable => "model not available",
            LlmErrorKind::InvalidResponse => "invalid response",
            LlmErrorKind::Config => "configuration",
        };
        f.write_str(s)
    }
}

/// An LLM failure with its classification.
#[derive(Debug, Clone, Error)]
#[error("LLM error ({kind}): {message}")]
pub struct LlmError {
    /// Failure classification
    pub kind: LlmErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl LlmError {
    /// Build an error of the given kind.
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    /// Provider-side throttling error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::RateLimited, message)
    }

    /// Network or HTTP transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Transport, message)
    }

    /// Unreadable provider response.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::InvalidResponse, message)
    }

    /// Whether this failure is eligible for backoff retry.
    pub fn is_rate_limited(&self) -> bool {
        self.kind == LlmErrorKind::RateLimited
    }
}

/// Trait for LLM provider operations.
///
/// Implemented by the infrastructure layer (`trestle-llm`).
#[allow(async_fn_in_trait)]
pub trait LlmProvider {
    /// Model context window, in tokens.
    fn context_length(&self) -> usize;

    /// Model output ceiling, in tokens.
    fn max_output_tokens(&self) -> usize;

    /// Issue one chat completion request and return the raw content.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String, LlmError>;
}

/// Trait for graph store operations.
///
/// Implemented by the infrastructure layer (`trestle-store`). All
/// mutations are idempotent upserts keyed by identity-defining
/// properties; concurrent callers rely on that plus store-side
/// uniqueness constraints rather than external locking.
#[allow(async_fn_in_trait)]
pub trait GraphStore {
    /// Error type for store operations
    type Error: std::fmt::Display;

    /// Create one Episode node and return its identity.
    async fn create_episode(&self, episode: NewEpisode<'_>) -> Result<Uuid, Self::Error>;

    /// Upsert validated entities by `(name, type)`.
    ///
    /// Returns the temp-id → identity map and the count of newly
    /// created nodes. When `episode` is given, each resulting entity is
    /// idempotently linked to it with a MENTIONS edge.
    async fn merge_entities(
        &self,
        entities: &[ExtractedEntity],
        episode: Option<Uuid>,
    ) -> Result<EntityMergeOutcome, Self::Error>;

    /// Upsert validated relationships by `(source, type, target)`.
    ///
    /// Endpoints resolve through `id_map`; relationships whose temp ids
    /// do not resolve are skipped with a logged reason. Returns the
    /// count of newly created edges.
    async fn merge_relationships(
        &self,
        relationships: &[ExtractedRelationship],
        id_map: &HashMap<String, Uuid>,
    ) -> Result<usize, Self::Error>;

    /// Aggregate node/edge/episode counts.
    async fn graph_stats(&self) -> Result<GraphStats, Self::Error>;

    /// Connectivity probe.
    async fn ping(&self) -> Result<(), Self::Error>;
}
