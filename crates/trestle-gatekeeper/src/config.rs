//! Gatekeeper configuration

use std::collections::HashSet;
use trestle_domain::{ENTITY_TYPES, RELATIONSHIP_TYPES};

/// Configuration for validation rules
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Entity types accepted by the validator
    pub allowed_entity_types: HashSet<String>,

    /// Relationship types accepted by the validator
    pub allowed_relationship_types: HashSet<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            allowed_entity_types: ENTITY_TYPES.iter().map(|t| t.to_string()).collect(),
            allowed_relationship_types: RELATIONSHIP_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl ValidationConfig {
    /// Build a configuration with custom vocabularies.
    pub fn with_vocabularies(
        entity_types: impl IntoIterator<Item = String>,
        relationship_types: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            allowed_entity_types: entity_types.into_iter().collect(),
            allowed_relationship_types: relationship_types.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_carries_full_vocabularies() {
        let config = ValidationConfig::default();
        assert_eq!(config.allowed_entity_types.len(), ENTITY_TYPES.len());
        assert_eq!(config.allowed_relationship_types.len(), RELATIONSHIP_TYPES.len());
        assert!(config.allowed_entity_types.contains("Material"));
        assert!(config.allowed_relationship_types.contains("USES_MATERIAL"));
    }

    #[test]
    fn test_custom_vocabularies() {
        let config = ValidationConfig::with_vocabularies(
            vec!["Widget".to_string()],
            vec!["HAS_PART".to_string()],
        );
        assert!(config.allowed_entity_types.contains("Widget"));
        assert!(!config.allowed_entity_types.contains("Material"));
    }
}
