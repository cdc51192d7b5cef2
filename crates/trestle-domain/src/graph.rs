//! Persisted graph model and merge-engine result types

use crate::extraction::PropertyMap;
use std::collections::HashMap;
use uuid::Uuid;

/// A persisted entity node.
///
/// Merge key is `(name, entity_type)`, exact match. Re-merging an
/// existing entity updates `last_seen_ms` and folds in new properties;
/// it never duplicates the node.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEntity {
    /// Stable identity, assigned on first merge
    pub uuid: Uuid,
    /// Canonical name (merge key, with `entity_type`)
    pub name: String,
    /// Type from the closed vocabulary (merge key, with `name`)
    pub entity_type: String,
    /// Accumulated properties
    pub properties: PropertyMap,
    /// Unix millis of first merge
    pub first_seen_ms: i64,
    /// Unix millis of most recent merge
    pub last_seen_ms: i64,
}

/// A persisted typed edge between two entities.
///
/// Merge key is `(source, rel_type, target)`. Re-merging overwrites
/// properties and sets `last_updated_ms`.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRelationship {
    /// Source entity identity
    pub source: Uuid,
    /// Target entity identity
    pub target: Uuid,
    /// Sanitized relationship type (merge key component)
    pub rel_type: String,
    /// Edge properties
    pub properties: PropertyMap,
    /// Unix millis of edge creation
    pub created_at_ms: i64,
    /// Unix millis of most recent property overwrite, if any
    pub last_updated_ms: Option<i64>,
}

/// A persisted provenance node, one per processed non-empty chunk.
///
/// Entities extracted from the chunk connect to the Episode via a
/// MENTIONS edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    /// Stable identity
    pub uuid: Uuid,
    /// Episode name, derived from document id and chunk index
    pub name: String,
    /// Full chunk text
    pub body: String,
    /// LLM summary of the chunk, when extraction succeeded
    pub summary: Option<String>,
    /// Human-readable description of where the text came from
    pub source_description: String,
    /// Reference time of the source material, unix millis
    pub reference_time_ms: i64,
    /// Unix millis of node creation
    pub created_at_ms: i64,
}

/// Borrowed input for creating an Episode node.
#[derive(Debug, Clone, Copy)]
pub struct NewEpisode<'a> {
    /// Episode name, e.g. `"doc_001_chunk_3"`
    pub name: &'a str,
    /// Full chunk text
    pub body: &'a str,
    /// LLM summary, if extraction produced one
    pub summary: Option<&'a str>,
    /// Description of the source material
    pub source_description: &'a str,
    /// Reference time of the source material, unix millis
    pub reference_time_ms: i64,
}

/// Result of merging one call's validated entities.
#[derive(Debug, Clone, Default)]
pub struct EntityMergeOutcome {
    /// How many entities were newly created (as opposed to matched)
    pub created: usize,
    /// Temp id → stable graph identity, for relationship resolution
    pub id_map: HashMap<String, Uuid>,
}

/// Aggregate counts over the whole graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Total node count (entities + episodes + anything else)
    pub node_count: u64,
    /// Total relationship count
    pub edge_count: u64,
    /// Episode node count
    pub episode_count: u64,
}
