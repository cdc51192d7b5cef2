//! Pipeline error types

use thiserror::Error;
use trestle_domain::LlmError;

/// Errors that abort document processing
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid pipeline configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// LLM provider failure that could not be retried away
    #[error("LLM provider error: {0}")]
    Llm(#[from] LlmError),

    /// The graph store rejected an operation or is unreachable.
    /// Processing stops immediately; per-chunk recovery does not apply
    /// to storage failures.
    #[error("Graph store unavailable: {0}")]
    StoreUnavailable(String),
}
