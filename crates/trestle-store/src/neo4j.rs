//! Neo4j implementation of the graph store
//!
//! One Bolt connection pool per store. Merge identity lives in the
//! Cypher MERGE patterns; created-versus-matched detection works by
//! passing a fresh uuid into ON CREATE and comparing it against the
//! uuid the query returns.

use crate::{now_ms, property_key, StoreConfig, StoreError, RESERVED_RELATIONSHIP_PROPS};
use neo4rs::{query, Graph, Query};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use trestle_domain::{
    sanitize_entity_label, sanitize_relationship_type, EntityMergeOutcome, ExtractedEntity,
    ExtractedRelationship, GraphStats, GraphStore, NewEpisode, PropertyMap,
};
use uuid::Uuid;

/// Neo4j-backed implementation of `GraphStore`
pub struct Neo4jStore {
    graph: Graph,
}

impl Neo4jStore {
    /// Connect to the configured Bolt endpoint.
    pub async fn connect(config: StoreConfig) -> Result<Self, StoreError> {
        let graph =
            Graph::new(config.uri.as_str(), config.user.as_str(), config.password.as_str())
                .await?;
        info!(uri = %config.uri, "connected to Neo4j");
        Ok(Self { graph })
    }

    /// Create the uniqueness constraints and indexes the merge queries
    /// rely on. Safe to call on every startup.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let statements = [
            "CREATE CONSTRAINT entity_uuid IF NOT EXISTS \
             FOR (e:Entity) REQUIRE e.uuid IS UNIQUE",
            "CREATE CONSTRAINT episodic_uuid IF NOT EXISTS \
             FOR (ep:Episodic) REQUIRE ep.uuid IS UNIQUE",
            "CREATE INDEX entity_name_type IF NOT EXISTS \
             FOR (e:Entity) ON (e.name, e.entity_type)",
        ];
        for statement in statements {
            self.graph.run(query(statement)).await?;
        }
        debug!("schema constraints and indexes ensured");
        Ok(())
    }

    async fn single_uuid(&self, q: Query, context: &str) -> Result<Uuid, StoreError> {
        let mut stream = self.graph.execute(q).await?;
        let row = stream
            .next()
            .await?
            .ok_or_else(|| StoreError::MissingResult(context.to_string()))?;
        let raw: String = row.get("uuid")?;
        Uuid::parse_str(&raw)
            .map_err(|e| StoreError::InvalidData(format!("{context}: bad uuid {raw}: {e}")))
    }

    async fn count(&self, cypher: &str) -> Result<u64, StoreError> {
        let mut stream = self.graph.execute(query(cypher)).await?;
        let row = stream
            .next()
            .await?
            .ok_or_else(|| StoreError::MissingResult("count query returned no row".to_string()))?;
        let count: i64 = row.get("c")?;
        Ok(count.max(0) as u64)
    }

    async fn merge_one_entity(
        &self,
        entity: &ExtractedEntity,
        now: i64,
    ) -> Result<(Uuid, bool), StoreError> {
        let label = sanitize_entity_label(&entity.entity_type);
        let candidate = Uuid::now_v7();
        let (set_clause, params) = prop_assignments("e", &entity.properties);

        let cypher = format!(
            "MERGE (e:Entity:{label} {{name: $name, entity_type: $entity_type}}) \
             ON CREATE SET e.uuid = $uuid, e.first_seen = $now, e.last_seen = $now{set_clause} \
             ON MATCH SET e.last_seen = $now{set_clause} \
             RETURN e.uuid AS uuid"
        );
        let mut q = query(&cypher)
            .param("name", entity.name.as_str())
            .param("entity_type", entity.entity_type.as_str())
            .param("uuid", candidate.to_string())
            .param("now", now);
        for (name, value) in &params {
            q = apply_param(q, name, value);
        }

        let uuid = self.single_uuid(q, "entity merge").await?;
        Ok((uuid, uuid == candidate))
    }

    async fn link_mention(&self, episode: Uuid, entity: Uuid) -> Result<(), StoreError> {
        let q = query(
            "MATCH (ep:Episodic {uuid: $episode}) \
             MATCH (e:Entity {uuid: $entity}) \
             MERGE (ep)-[:MENTIONS]->(e)",
        )
        .param("episode", episode.to_string())
        .param("entity", entity.to_string());
        self.graph.run(q).await?;
        Ok(())
    }
}

impl GraphStore for Neo4jStore {
    type Error = StoreError;

    async fn create_episode(&self, episode: NewEpisode<'_>) -> Result<Uuid, Self::Error> {
        let uuid = Uuid::now_v7();
        let summary_clause = if episode.summary.is_some() { ", summary: $summary" } else { "" };
        let cypher = format!(
            "CREATE (ep:Episodic {{uuid: $uuid, name: $name, body: $body, \
             source_description: $source_description, reference_time: $reference_time, \
             created_at: $now{summary_clause}}})"
        );
        let mut q = query(&cypher)
            .param("uuid", uuid.to_string())
            .param("name", episode.name)
            .param("body", episode.body)
            .param("source_description", episode.source_description)
            .param("reference_time", episode.reference_time_ms)
            .param("now", now_ms());
        if let Some(summary) = episode.summary {
            q = q.param("summary", summary);
        }
        self.graph.run(q).await?;
        debug!(name = %episode.name, %uuid, "created episode");
        Ok(uuid)
    }

    async fn merge_entities(
        &self,
        entities: &[ExtractedEntity],
        episode: Option<Uuid>,
    ) -> Result<EntityMergeOutcome, Self::Error> {
        let now = now_ms();
        let mut outcome = EntityMergeOutcome::default();

        for entity in entities {
            let (uuid, created) = self.merge_one_entity(entity, now).await?;
            if created {
                outcome.created += 1;
            }
            if let Some(episode) = episode {
                self.link_mention(episode, uuid).await?;
            }
            outcome.id_map.insert(entity.id.clone(), uuid);
        }

        debug!(
            merged = entities.len(),
            created = outcome.created,
            "entity merge complete"
        );
        Ok(outcome)
    }

    async fn merge_relationships(
        &self,
        relationships: &[ExtractedRelationship],
        id_map: &HashMap<String, Uuid>,
    ) -> Result<usize, Self::Error> {
        let now = now_ms();
        let mut created_count = 0;

        for relationship in relationships {
            let (Some(source), Some(target)) = (
                id_map.get(&relationship.source_id),
                id_map.get(&relationship.target_id),
            ) else {
                warn!(
                    source = %relationship.source_id,
                    target = %relationship.target_id,
                    rel_type = %relationship.rel_type,
                    "skipping relationship with unresolved endpoint"
                );
                continue;
            };

            let rel_type = sanitize_relationship_type(&relationship.rel_type);
            let candidate = Uuid::now_v7();
            let properties = strip_reserved(&relationship.properties);
            let (set_clause, params) = prop_assignments("r", &properties);

            let cypher = format!(
                "MATCH (s:Entity {{uuid: $source}}) \
                 MATCH (t:Entity {{uuid: $target}}) \
                 MERGE (s)-[r:{rel_type}]->(t) \
                 ON CREATE SET r.uuid = $uuid, r.created_at = $now{set_clause} \
                 ON MATCH SET r.last_updated = $now{set_clause} \
                 RETURN r.uuid AS uuid"
            );
            let mut q = query(&cypher)
                .param("source", source.to_string())
                .param("target", target.to_string())
                .param("uuid", candidate.to_string())
                .param("now", now);
            for (name, value) in &params {
                q = apply_param(q, name, value);
            }

            let uuid = self.single_uuid(q, "relationship merge").await?;
            if uuid == candidate {
                created_count += 1;
            }
        }

        debug!(
            merged = relationships.len(),
            created = created_count,
            "relationship merge complete"
        );
        Ok(created_count)
    }

    async fn graph_stats(&self) -> Result<GraphStats, Self::Error> {
        Ok(GraphStats {
            node_count: self.count("MATCH (n) RETURN count(n) AS c").await?,
            edge_count: self.count("MATCH ()-[r]->() RETURN count(r) AS c").await?,
            episode_count: self.count("MATCH (n:Episodic) RETURN count(n) AS c").await?,
        })
    }

    async fn ping(&self) -> Result<(), Self::Error> {
        let mut stream = self.graph.execute(query("RETURN 1 AS ok")).await?;
        stream
            .next()
            .await?
            .ok_or_else(|| StoreError::MissingResult("ping returned no row".to_string()))?;
        Ok(())
    }
}

/// Build the `, prefix.key = $pN` assignment tail for a property bag,
/// with the matching parameter values. Null values and unsanitizable
/// keys are skipped.
fn prop_assignments(prefix: &str, properties: &PropertyMap) -> (String, Vec<(String, Value)>) {
    let mut clause = String::new();
    let mut params = Vec::new();
    for (key, value) in properties {
        if value.is_null() {
            continue;
        }
        let Some(cleaned) = property_key(key) else {
            warn!(key, "skipping property with unsanitizable key");
            continue;
        };
        let name = format!("p{}", params.len());
        clause.push_str(&format!(", {prefix}.{cleaned} = ${name}"));
        params.push((name, value.clone()));
    }
    (clause, params)
}

/// Attach one JSON value as a Bolt parameter. Scalars map directly;
/// arrays and objects are stored as JSON strings.
fn apply_param(q: Query, name: &str, value: &Value) -> Query {
    match value {
        Value::String(s) => q.param(name, s.clone()),
        Value::Bool(b) => q.param(name, *b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.param(name, i)
            } else {
                q.param(name, n.as_f64().unwrap_or(0.0))
            }
        }
        other => q.param(name, other.to_string()),
    }
}

fn strip_reserved(properties: &PropertyMap) -> PropertyMap {
    properties
        .iter()
        .filter(|(key, _)| !RESERVED_RELATIONSHIP_PROPS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
