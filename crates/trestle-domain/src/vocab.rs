//! Closed type vocabularies for extraction
//!
//! The extraction prompt offers exactly these types, and the validator
//! rejects anything outside them. The lists come from the bridge
//! engineering corpus the pipeline was built for; deployments covering a
//! different domain swap them via `ValidationConfig` in
//! `trestle-gatekeeper`.

/// Entity types the extraction prompt allows.
pub const ENTITY_TYPES: &[&str] = &[
    "Material",
    "BridgeComponent",
    "ConstructionMethod",
    "DesignStandard",
    "Location",
    "Organization",
    "DamageType",
    "InspectionTechnique",
    "Permit",
    "Bridge",
    "BridgeSection",
    "Sensor",
    "MonitoringSystem",
    "Regulation",
    "Software",
    "EnvironmentalFactor",
    "LoadType",
    "GeotechnicalFeature",
];

/// Relationship types the extraction prompt allows.
pub const RELATIONSHIP_TYPES: &[&str] = &[
    "USES_MATERIAL",
    "HAS_COMPONENT",
    "EMPLOYS_METHOD",
    "COMPLIES_WITH_STANDARD",
    "LOCATED_AT",
    "PART_OF",
    "CONNECTS_TO",
    "MANUFACTURED_BY",
    "DESIGNED_BY",
    "HAS_SPECIFICATION",
    "CONSTRUCTED_BY",
    "HAS_DAMAGE",
    "DETECTS_DAMAGE",
    "APPLIES_TECHNIQUE",
    "REQUIRES_PERMIT",
    "SPECIFIED_IN",
    "MEASURES_PROPERTY",
    "MONITORS_COMPONENT",
    "ASSESSES_RISK",
    "ANALYZED_WITH",
    "AFFECTED_BY",
    "SUBJECT_TO_LOAD",
    "FOUNDED_ON",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{sanitize_entity_label, sanitize_relationship_type};

    #[test]
    fn test_vocab_types_are_already_store_safe() {
        for t in ENTITY_TYPES {
            assert_eq!(&sanitize_entity_label(t), t);
        }
        for t in RELATIONSHIP_TYPES {
            assert_eq!(&sanitize_relationship_type(t), t);
        }
    }
}
