//! In-memory implementation of the graph store
//!
//! Mirrors the Neo4j merge semantics exactly, keyed on the same
//! identities, so pipeline tests exercise real idempotence behavior
//! without a server.

use crate::{now_ms, StoreError, RESERVED_RELATIONSHIP_PROPS};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tracing::warn;
use trestle_domain::{
    sanitize_relationship_type, EntityMergeOutcome, Episode, ExtractedEntity,
    ExtractedRelationship, GraphEntity, GraphRelationship, GraphStats, GraphStore, NewEpisode,
};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Inner {
    /// Entities keyed by `(name, entity_type)`
    entities: HashMap<(String, String), GraphEntity>,
    /// Relationships keyed by `(source, sanitized type, target)`
    relationships: HashMap<(Uuid, String, Uuid), GraphRelationship>,
    episodes: Vec<Episode>,
    mentions: HashSet<(Uuid, Uuid)>,
}

/// In-memory `GraphStore` with Neo4j-equivalent merge semantics
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Look up an entity by its merge key.
    pub fn entity(&self, name: &str, entity_type: &str) -> Option<GraphEntity> {
        self.lock().entities.get(&(name.to_string(), entity_type.to_string())).cloned()
    }

    /// Look up a relationship by its merge key.
    pub fn relationship(
        &self,
        source: Uuid,
        rel_type: &str,
        target: Uuid,
    ) -> Option<GraphRelationship> {
        let key = (source, sanitize_relationship_type(rel_type), target);
        self.lock().relationships.get(&key).cloned()
    }

    /// All stored episodes, in creation order.
    pub fn episodes(&self) -> Vec<Episode> {
        self.lock().episodes.clone()
    }

    /// Whether the given episode mentions the given entity.
    pub fn mentions(&self, episode: Uuid, entity: Uuid) -> bool {
        self.lock().mentions.contains(&(episode, entity))
    }
}

impl GraphStore for MemoryStore {
    type Error = StoreError;

    async fn create_episode(&self, episode: NewEpisode<'_>) -> Result<Uuid, Self::Error> {
        let uuid = Uuid::now_v7();
        self.lock().episodes.push(Episode {
            uuid,
            name: episode.name.to_string(),
            body: episode.body.to_string(),
            summary: episode.summary.map(str::to_string),
            source_description: episode.source_description.to_string(),
            reference_time_ms: episode.reference_time_ms,
            created_at_ms: now_ms(),
        });
        Ok(uuid)
    }

    async fn merge_entities(
        &self,
        entities: &[ExtractedEntity],
        episode: Option<Uuid>,
    ) -> Result<EntityMergeOutcome, Self::Error> {
        let now = now_ms();
        let mut inner = self.lock();
        let mut outcome = EntityMergeOutcome::default();

        for entity in entities {
            let key = (entity.name.clone(), entity.entity_type.clone());
            let uuid = match inner.entities.get_mut(&key) {
                Some(existing) => {
                    existing.last_seen_ms = now;
                    for (prop_key, value) in &entity.properties {
                        if !value.is_null() {
                            existing.properties.insert(prop_key.clone(), value.clone());
                        }
                    }
                    existing.uuid
                }
                None => {
                    let uuid = Uuid::now_v7();
                    inner.entities.insert(
                        key,
                        GraphEntity {
                            uuid,
                            name: entity.name.clone(),
                            entity_type: entity.entity_type.clone(),
                            properties: entity
                                .properties
                                .iter()
                                .filter(|(_, v)| !v.is_null())
                                .map(|(k, v)| (k.clone(), v.clone()))
                                .collect(),
                            first_seen_ms: now,
                            last_seen_ms: now,
                        },
                    );
                    outcome.created += 1;
                    uuid
                }
            };

            if let Some(episode) = episode {
                inner.mentions.insert((episode, uuid));
            }
            outcome.id_map.insert(entity.id.clone(), uuid);
        }

        Ok(outcome)
    }

    async fn merge_relationships(
        &self,
        relationships: &[ExtractedRelationship],
        id_map: &HashMap<String, Uuid>,
    ) -> Result<usize, Self::Error> {
        let now = now_ms();
        let mut inner = self.lock();
        let mut created_count = 0;

        for relationship in relationships {
            let (Some(&source), Some(&target)) = (
                id_map.get(&relationship.source_id),
                id_map.get(&relationship.target_id),
            ) else {
                warn!(
                    source = %relationship.source_id,
                    target = %relationship.target_id,
                    "skipping relationship with unresolved endpoint"
                );
                continue;
            };

            let rel_type = sanitize_relationship_type(&relationship.rel_type);
            let properties = relationship
                .properties
                .iter()
                .filter(|(key, value)| {
                    !RESERVED_RELATIONSHIP_PROPS.contains(&key.as_str()) && !value.is_null()
                })
                .map(|(key, value)| (key.clone(), value.clone()));

            match inner.relationships.get_mut(&(source, rel_type.clone(), target)) {
                Some(existing) => {
                    existing.properties.extend(properties);
                    existing.last_updated_ms = Some(now);
                }
                None => {
                    inner.relationships.insert(
                        (source, rel_type.clone(), target),
                        GraphRelationship {
                            source,
                            target,
                            rel_type,
                            properties: properties.collect(),
                            created_at_ms: now,
                            last_updated_ms: None,
                        },
                    );
                    created_count += 1;
                }
            }
        }

        Ok(created_count)
    }

    async fn graph_stats(&self) -> Result<GraphStats, Self::Error> {
        let inner = self.lock();
        Ok(GraphStats {
            node_count: (inner.entities.len() + inner.episodes.len()) as u64,
            edge_count: (inner.relationships.len() + inner.mentions.len()) as u64,
            episode_count: inner.episodes.len() as u64,
        })
    }

    async fn ping(&self) -> Result<(), Self::Error> {
        Ok(())
    }
}
