//! Configuration for the document pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the document pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum chunk size (characters)
    pub max_chunk_size: usize,

    /// Overlap between pieces of a hard-split oversized sentence (characters)
    pub chunk_overlap: usize,

    /// Maximum retry attempts after a rate-limited extraction call
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds); doubles per attempt
    pub retry_initial_delay_ms: u64,

    /// Description attached to every Episode created from a document
    pub source_description: String,
}

impl PipelineConfig {
    /// Get the initial retry delay as a Duration
    pub fn retry_initial_delay(&self) -> Duration {
        Duration::from_millis(self.retry_initial_delay_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chunk_size == 0 {
            return Err("max_chunk_size must be greater than 0".to_string());
        }
        if self.chunk_overlap >= self.max_chunk_size {
            return Err("chunk_overlap must be smaller than max_chunk_size".to_string());
        }
        Ok(())
    }

    /// Fine-grained preset: smaller chunks for dense technical text
    pub fn fine_grained() -> Self {
        Self {
            max_chunk_size: 1_000,
            chunk_overlap: 50,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 3_000,
            chunk_overlap: 100,
            max_retries: 3,
            retry_initial_delay_ms: 5_000,
            source_description: "document ingest".to_string(),
        }
    }
}
