//! Trestle Domain Layer
//!
//! Core data model and trait seams for the Trestle knowledge-graph
//! ingestion pipeline. Everything other crates agree on lives here:
//!
//! - **Chunk**: a bounded, ordered text segment from the segmenter
//! - **Extraction**: the typed shape of one LLM extraction call
//! - **GraphEntity / GraphRelationship / Episode**: the persisted model
//! - **Vocabularies**: the closed entity/relationship type sets
//! - **Traits**: `LlmProvider` and `GraphStore`, the two infrastructure
//!   boundaries the pipeline is generic over
//!
//! Infrastructure implementations live in `trestle-llm` and
//! `trestle-store`; this crate carries only the model and the seams.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod extraction;
pub mod graph;
pub mod labels;
pub mod traits;
pub mod vocab;

// Re-exports for convenience
pub use chunk::Chunk;
pub use extraction::{Extraction, ExtractedEntity, ExtractedRelationship, PropertyMap};
pub use graph::{Episode, EntityMergeOutcome, GraphEntity, GraphRelationship, GraphStats, NewEpisode};
pub use labels::{sanitize_entity_label, sanitize_relationship_type};
pub use traits::{ChatMessage, CompletionOptions, GraphStore, LlmError, LlmErrorKind, LlmProvider, Role};
pub use vocab::{ENTITY_TYPES, RELATIONSHIP_TYPES};
