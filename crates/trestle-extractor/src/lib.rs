//! Trestle Extractor
//!
//! The document pipeline: converts unstructured engineering text into
//! knowledge-graph updates.
//!
//! # Architecture
//!
//! ```text
//! Text → Segmenter → LLM Gateway → Gatekeeper → GraphStore
//!                        │                          │
//!                   (extraction)              (Episodes +
//!                                          idempotent merges)
//! ```
//!
//! Documents are segmented into bounded chunks; each chunk is sent
//! through one structured extraction call, validated, and merged into
//! the graph with an Episode node recording provenance. LLM failures
//! are contained to their chunk; rate limits are retried with backoff;
//! store failures abort the document.
//!
//! # Example Usage
//!
//! ```no_run
//! use trestle_extractor::{DocumentPipeline, PipelineConfig};
//!
//! # async fn example() -> Result<(), trestle_extractor::PipelineError> {
//! // Reads DEEPSEEK_* and NEO4J_* from the environment.
//! let pipeline = DocumentPipeline::from_env(PipelineConfig::default()).await?;
//!
//! let result = pipeline
//!     .process_document("doc_001", "The main girder uses S355 steel.")
//!     .await?;
//!
//! println!("Created: {} entities", result.entities_created);
//! println!("Created: {} relationships", result.relationships_created);
//! println!("Failed chunks: {}", result.failures.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod pipeline;
mod prompt;
mod segmenter;
mod types;

#[cfg(test)]
mod tests;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use pipeline::DocumentPipeline;
pub use prompt::{PromptBuilder, EXTRACTION_SCHEMA};
pub use segmenter::Segmenter;
pub use types::{ChunkFailure, ChunkStage, DocumentResult, Health};
