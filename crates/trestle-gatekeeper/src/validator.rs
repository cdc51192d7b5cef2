//! Extraction validation logic

use crate::ValidationConfig;
use std::collections::HashSet;
use tracing::warn;
use trestle_domain::{ExtractedEntity, ExtractedRelationship, Extraction};

/// Result of validating one extraction
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    /// Entities that passed validation, in input order
    pub entities: Vec<ExtractedEntity>,

    /// Relationships that passed validation, in input order
    pub relationships: Vec<ExtractedRelationship>,

    /// One record per dropped item
    pub rejections: Vec<Rejection>,
}

impl ValidationOutcome {
    /// Whether anything was dropped.
    pub fn has_rejections(&self) -> bool {
        !self.rejections.is_empty()
    }
}

/// A dropped item and why it was dropped
#[derive(Debug, Clone)]
pub struct Rejection {
    /// Why the item was dropped
    pub reason: RejectionReason,

    /// Identifying detail (temp id, name, or type)
    pub detail: String,
}

/// Reasons for dropping an extracted item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// Entity is missing its id, name, or type
    EntityMissingField,

    /// Entity type is not in the allowed vocabulary
    EntityTypeUnknown,

    /// Entity reuses a temp id already seen in this extraction
    DuplicateTempId,

    /// Relationship is missing its source, target, or type
    RelationshipMissingField,

    /// Relationship type is not in the allowed vocabulary
    RelationshipTypeUnknown,

    /// Relationship endpoint does not resolve to a validated entity
    UnresolvedEndpoint,

    /// Relationship source and target are the same entity
    SelfLoop,
}

/// The Gatekeeper filters raw extractions against the configured rules
pub struct Gatekeeper {
    config: ValidationConfig,
}

impl Gatekeeper {
    /// Create a new Gatekeeper with the given configuration.
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Create a Gatekeeper with the default vocabularies.
    pub fn default_config() -> Self {
        Self::new(ValidationConfig::default())
    }

    /// Validate one extraction, keeping only well-formed items.
    ///
    /// Entities are checked first; relationships may only reference
    /// entities that survived. Every dropped item gets a rejection
    /// record and a warning log line.
    pub fn validate(&self, extraction: &Extraction) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();
        let mut seen_ids: HashSet<&str> = HashSet::new();

        for entity in &extraction.entities {
            match self.check_entity(entity, &seen_ids) {
                None => {
                    seen_ids.insert(entity.id.as_str());
                    outcome.entities.push(entity.clone());
                }
                Some(reason) => {
                    let detail = if entity.id.is_empty() {
                        entity.name.clone()
                    } else {
                        entity.id.clone()
                    };
                    warn!(?reason, entity = %detail, "dropped extracted entity");
                    outcome.rejections.push(Rejection { reason, detail });
                }
            }
        }

        for relationship in &extraction.relationships {
            match self.check_relationship(relationship, &seen_ids) {
                None => outcome.relationships.push(relationship.clone()),
                Some(reason) => {
                    let detail = format!(
                        "{} -[{}]-> {}",
                        relationship.source_id, relationship.rel_type, relationship.target_id
                    );
                    warn!(?reason, relationship = %detail, "dropped extracted relationship");
                    outcome.rejections.push(Rejection { reason, detail });
                }
            }
        }

        outcome
    }

    fn check_entity(
        &self,
        entity: &ExtractedEntity,
        seen_ids: &HashSet<&str>,
    ) -> Option<RejectionReason> {
        if entity.id.is_empty() || entity.name.is_empty() || entity.entity_type.is_empty() {
            return Some(RejectionReason::EntityMissingField);
        }
        if !self.config.allowed_entity_types.contains(&entity.entity_type) {
            return Some(RejectionReason::EntityTypeUnknown);
        }
        // First occurrence of a temp id wins.
        if seen_ids.contains(entity.id.as_str()) {
            return Some(RejectionReason::DuplicateTempId);
        }
        None
    }

    fn check_relationship(
        &self,
        relationship: &ExtractedRelationship,
        seen_ids: &HashSet<&str>,
    ) -> Option<RejectionReason> {
        if relationship.source_id.is_empty()
            || relationship.target_id.is_empty()
            || relationship.rel_type.is_empty()
        {
            return Some(RejectionReason::RelationshipMissingField);
        }
        if !self.config.allowed_relationship_types.contains(&relationship.rel_type) {
            return Some(RejectionReason::RelationshipTypeUnknown);
        }
        if !seen_ids.contains(relationship.source_id.as_str())
            || !seen_ids.contains(relationship.target_id.as_str())
        {
            return Some(RejectionReason::UnresolvedEndpoint);
        }
        if relationship.source_id == relationship.target_id {
            return Some(RejectionReason::SelfLoop);
        }
        None
    }
}
