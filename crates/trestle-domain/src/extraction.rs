//! Typed shape of one LLM extraction call
//!
//! The gateway deserializes the model's JSON into these structs. Every
//! field carries `#[serde(default)]`, so a response missing a required
//! field degrades to its zero value instead of failing the call — the
//! default-filling contract is encoded in deserialization itself rather
//! than in ad hoc dynamic field access.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Free-form property bag attached to entities and relationships.
///
/// `BTreeMap` keeps iteration deterministic, which matters for both
/// Cypher parameter generation and test stability.
pub type PropertyMap = BTreeMap<String, serde_json::Value>;

/// Everything one extraction call returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Extraction {
    /// Concise technical summary of the chunk (2-3 sentences)
    #[serde(default)]
    pub summary: String,

    /// Entities the model found in the chunk
    #[serde(default)]
    pub entities: Vec<ExtractedEntity>,

    /// Relationships between those entities, by temp id
    #[serde(default)]
    pub relationships: Vec<ExtractedRelationship>,
}

impl Extraction {
    /// Whether the call produced nothing usable.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }
}

/// One entity as extracted by the LLM, before validation.
///
/// The `id` is a temp id ("e1", "e2", ...) scoped to a single extraction
/// call. It is never persisted; the merge engine maps it to a stable
/// graph identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractedEntity {
    /// Call-scoped temp id
    #[serde(default)]
    pub id: String,

    /// Canonical entity name (the merge key, with `entity_type`)
    #[serde(default)]
    pub name: String,

    /// Entity type, expected to come from the closed vocabulary
    #[serde(default, rename = "type")]
    pub entity_type: String,

    /// Optional extra attributes found in the text
    #[serde(default)]
    pub properties: PropertyMap,
}

/// One relationship as extracted by the LLM, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractedRelationship {
    /// Temp id of the source entity
    #[serde(default)]
    pub source_id: String,

    /// Temp id of the target entity
    #[serde(default)]
    pub target_id: String,

    /// Relationship type, expected to come from the closed vocabulary
    #[serde(default, rename = "type")]
    pub rel_type: String,

    /// Optional extra attributes of the edge
    #[serde(default)]
    pub properties: PropertyMap,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let extraction: Extraction = serde_json::from_str(r#"{"summary": "only a summary"}"#).unwrap();
        assert_eq!(extraction.summary, "only a summary");
        assert!(extraction.entities.is_empty());
        assert!(extraction.relationships.is_empty());
    }

    #[test]
    fn test_entity_type_field_renamed() {
        let entity: ExtractedEntity = serde_json::from_str(
            r#"{"id": "e1", "name": "S355 Steel", "type": "Material"}"#,
        )
        .unwrap();
        assert_eq!(entity.entity_type, "Material");
        assert!(entity.properties.is_empty());
    }

    #[test]
    fn test_entity_missing_name_defaults_to_empty() {
        let entity: ExtractedEntity = serde_json::from_str(r#"{"id": "e1"}"#).unwrap();
        assert!(entity.name.is_empty());
    }

    #[test]
    fn test_relationship_with_properties() {
        let rel: ExtractedRelationship = serde_json::from_str(
            r#"{"source_id": "e1", "target_id": "e2", "type": "USES_MATERIAL",
                "properties": {"location_on_bridge": "deck"}}"#,
        )
        .unwrap();
        assert_eq!(rel.rel_type, "USES_MATERIAL");
        assert_eq!(
            rel.properties.get("location_on_bridge").unwrap(),
            &serde_json::json!("deck")
        );
    }
}
