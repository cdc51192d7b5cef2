//! End-to-end pipeline tests over the mock provider and memory store

use crate::{ChunkStage, DocumentPipeline, PipelineConfig, PipelineError};
use std::collections::HashMap;
use trestle_domain::{
    EntityMergeOutcome, ExtractedEntity, ExtractedRelationship, GraphStats, GraphStore, NewEpisode,
};
use trestle_llm::MockProvider;
use trestle_store::MemoryStore;
use uuid::Uuid;

const GIRDER_EXTRACTION: &str = r#"{
  "summary": "The main girder is fabricated from S355 structural steel.",
  "entities": [
    {"id": "e1", "name": "Main Girder", "type": "BridgeComponent", "properties": {}},
    {"id": "e2", "name": "S355 Steel", "type": "Material", "properties": {}}
  ],
  "relationships": [
    {"source_id": "e1", "target_id": "e2", "type": "USES_MATERIAL", "properties": {}}
  ]
}"#;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn test_config() -> PipelineConfig {
    PipelineConfig {
        retry_initial_delay_ms: 1,
        ..PipelineConfig::default()
    }
}

fn pipeline(provider: MockProvider) -> DocumentPipeline<MockProvider, MemoryStore> {
    init_tracing();
    DocumentPipeline::new(provider, MemoryStore::new(), test_config()).unwrap()
}

#[tokio::test]
async fn test_single_chunk_document_end_to_end() {
    let pipeline = pipeline(MockProvider::new(GIRDER_EXTRACTION));
    let result = pipeline
        .process_document("doc_001", "The main girder uses S355 steel.")
        .await
        .unwrap();

    assert!(result.is_complete());
    assert_eq!(result.chunks_processed, 1);
    assert_eq!(result.entities_extracted, 2);
    assert_eq!(result.entities_created, 2);
    assert_eq!(result.relationships_extracted, 1);
    assert_eq!(result.relationships_created, 1);
    assert_eq!(result.episodes_created, 1);

    let episodes = pipeline.store().episodes();
    assert_eq!(episodes.len(), 1);
    assert_eq!(episodes[0].name, "doc_001_chunk_1");
    assert_eq!(
        episodes[0].summary.as_deref(),
        Some("The main girder is fabricated from S355 structural steel.")
    );

    let girder = pipeline.store().entity("Main Girder", "BridgeComponent").unwrap();
    assert!(pipeline.store().mentions(episodes[0].uuid, girder.uuid));
}

#[tokio::test]
async fn test_one_episode_per_chunk() {
    let config = PipelineConfig {
        max_chunk_size: 40,
        chunk_overlap: 5,
        retry_initial_delay_ms: 1,
        ..PipelineConfig::default()
    };
    let pipeline =
        DocumentPipeline::new(MockProvider::new("{}"), MemoryStore::new(), config).unwrap();

    let text = "The deck rests on piers. Piers carry the load down. \
                Foundations sit on bedrock. Cables hold the towers.";
    let result = pipeline.process_document("doc_002", text).await.unwrap();

    assert!(result.chunks_processed > 1);
    assert_eq!(result.episodes_created, result.chunks_processed);
    assert_eq!(pipeline.store().episodes().len(), result.chunks_processed);
}

#[tokio::test]
async fn test_reprocessing_is_idempotent() {
    let pipeline = pipeline(MockProvider::new(GIRDER_EXTRACTION));
    let text = "The main girder uses S355 steel.";

    let first = pipeline.process_document("doc_001", text).await.unwrap();
    assert_eq!(first.entities_created, 2);
    assert_eq!(first.relationships_created, 1);

    let second = pipeline.process_document("doc_001", text).await.unwrap();
    assert_eq!(second.entities_created, 0);
    assert_eq!(second.relationships_created, 0);

    // Episodes are provenance, not merged: one per run.
    assert_eq!(pipeline.store().episodes().len(), 2);
}

#[tokio::test]
async fn test_remerge_enriches_entity_properties() {
    let provider = MockProvider::new(GIRDER_EXTRACTION);
    provider.push_response(GIRDER_EXTRACTION);
    provider.push_response(
        r#"{
          "summary": "S355 steel has a 355 MPa yield strength.",
          "entities": [
            {"id": "e1", "name": "S355 Steel", "type": "Material",
             "properties": {"yield_strength": "355 MPa"}}
          ],
          "relationships": []
        }"#,
    );
    let pipeline = pipeline(provider);

    pipeline.process_document("doc_001", "The main girder uses S355 steel.").await.unwrap();
    let second = pipeline
        .process_document("doc_003", "S355 steel yields at 355 MPa.")
        .await
        .unwrap();

    assert_eq!(second.entities_created, 0);
    let steel = pipeline.store().entity("S355 Steel", "Material").unwrap();
    assert_eq!(steel.properties["yield_strength"], serde_json::json!("355 MPa"));
}

#[tokio::test]
async fn test_duplicate_temp_ids_keep_first() {
    let provider = MockProvider::new(
        r#"{
          "entities": [
            {"id": "e1", "name": "Pylon", "type": "BridgeComponent"},
            {"id": "e1", "name": "Other Pylon", "type": "BridgeComponent"}
          ],
          "relationships": []
        }"#,
    );
    let pipeline = pipeline(provider);
    let result = pipeline.process_document("doc", "Two pylons.").await.unwrap();

    assert_eq!(result.entities_extracted, 2);
    assert_eq!(result.entities_created, 1);
    assert!(pipeline.store().entity("Pylon", "BridgeComponent").is_some());
    assert!(pipeline.store().entity("Other Pylon", "BridgeComponent").is_none());
}

#[tokio::test]
async fn test_self_loop_relationship_dropped() {
    let provider = MockProvider::new(
        r#"{
          "entities": [{"id": "e1", "name": "Deck", "type": "BridgeComponent"}],
          "relationships": [{"source_id": "e1", "target_id": "e1", "type": "PART_OF"}]
        }"#,
    );
    let pipeline = pipeline(provider);
    let result = pipeline.process_document("doc", "The deck.").await.unwrap();

    assert!(result.is_complete());
    assert_eq!(result.relationships_extracted, 1);
    assert_eq!(result.relationships_created, 0);
}

#[tokio::test]
async fn test_malformed_output_degrades_to_empty_extraction() {
    let pipeline = pipeline(MockProvider::new("I am unable to comply with the format."));
    let result = pipeline.process_document("doc", "Some text.").await.unwrap();

    assert!(result.is_complete());
    assert_eq!(result.entities_extracted, 0);
    assert_eq!(result.episodes_created, 1);
    assert_eq!(pipeline.store().episodes()[0].summary, None);
}

#[tokio::test]
async fn test_rate_limit_retried_until_success() {
    let provider = MockProvider::new(GIRDER_EXTRACTION);
    provider.push_error(trestle_domain::LlmError::rate_limited("throttled"));
    let pipeline = pipeline(provider);

    let result = pipeline
        .process_document("doc", "The main girder uses S355 steel.")
        .await
        .unwrap();

    assert!(result.is_complete());
    assert_eq!(result.entities_created, 2);
    assert_eq!(pipeline.provider().call_count(), 2);
}

#[tokio::test]
async fn test_rate_limit_exhaustion_fails_chunk() {
    let provider = MockProvider::new(GIRDER_EXTRACTION);
    for _ in 0..4 {
        provider.push_error(trestle_domain::LlmError::rate_limited("throttled"));
    }
    let pipeline = pipeline(provider);

    let result = pipeline.process_document("doc", "Some text.").await.unwrap();
    assert!(!result.is_complete());
    assert_eq!(result.failures[0].stage, ChunkStage::Extracting);
    // The failed chunk still gets its provenance Episode, without a summary.
    assert_eq!(result.episodes_created, 1);
    assert_eq!(pipeline.store().episodes()[0].summary, None);
}

#[tokio::test]
async fn test_transport_error_not_retried() {
    let provider = MockProvider::new(GIRDER_EXTRACTION);
    provider.push_error(trestle_domain::LlmError::transport("connection reset"));
    let pipeline = pipeline(provider);

    let result = pipeline.process_document("doc", "Some text.").await.unwrap();
    assert!(!result.is_complete());
    assert_eq!(result.failures.len(), 1);
    assert!(result.failures[0].message.contains("connection reset"));
}

#[tokio::test]
async fn test_store_failure_aborts_document() {
    let pipeline =
        DocumentPipeline::new(MockProvider::new(GIRDER_EXTRACTION), FailingStore, test_config())
            .unwrap();

    let outcome = pipeline.process_document("doc", "Some text.").await;
    assert!(matches!(outcome, Err(PipelineError::StoreUnavailable(_))));
}

#[tokio::test]
async fn test_graph_stats_and_health() {
    let pipeline = pipeline(MockProvider::new(GIRDER_EXTRACTION));
    pipeline
        .process_document("doc_001", "The main girder uses S355 steel.")
        .await
        .unwrap();

    let stats = pipeline.graph_stats().await.unwrap();
    assert_eq!(stats.episode_count, 1);
    // 2 entities + 1 episode; USES_MATERIAL + 2 MENTIONS.
    assert_eq!(stats.node_count, 3);
    assert_eq!(stats.edge_count, 3);

    assert!(pipeline.health().await.available());
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let config = PipelineConfig { max_chunk_size: 0, ..PipelineConfig::default() };
    let outcome = DocumentPipeline::new(MockProvider::new("{}"), MemoryStore::new(), config);
    assert!(matches!(outcome, Err(PipelineError::Config(_))));
}

/// Store double whose every operation fails.
struct FailingStore;

impl GraphStore for FailingStore {
    type Error = String;

    async fn create_episode(&self, _episode: NewEpisode<'_>) -> Result<Uuid, Self::Error> {
        Err("connection refused".to_string())
    }

    async fn merge_entities(
        &self,
        _entities: &[ExtractedEntity],
        _episode: Option<Uuid>,
    ) -> Result<EntityMergeOutcome, Self::Error> {
        Err("connection refused".to_string())
    }

    async fn merge_relationships(
        &self,
        _relationships: &[ExtractedRelationship],
        _id_map: &HashMap<String, Uuid>,
    ) -> Result<usize, Self::Error> {
        Err("connection refused".to_string())
    }

    async fn graph_stats(&self) -> Result<GraphStats, Self::Error> {
        Err("connection refused".to_string())
    }

    async fn ping(&self) -> Result<(), Self::Error> {
        Err("connection refused".to_string())
    }
}
