//! Document processing orchestrator

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::prompt::{PromptBuilder, EXTRACTION_SCHEMA};
use crate::segmenter::Segmenter;
use crate::types::{ChunkFailure, ChunkStage, DocumentResult, Health};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};
use trestle_domain::{
    ChatMessage, Chunk, Extraction, GraphStats, GraphStore, LlmError, LlmProvider, NewEpisode,
};
use trestle_gatekeeper::{Gatekeeper, ValidationConfig};
use trestle_llm::{DeepSeekProvider, LlmGateway};
use trestle_store::{Neo4jStore, StoreConfig};

/// The pipeline turns documents into graph updates
///
/// Each chunk moves through the stage machine in [`ChunkStage`]. LLM
/// failures are contained to their chunk (rate limits retried with
/// doubling backoff first); store failures abort the document.
pub struct DocumentPipeline<P, S>
where
    P: LlmProvider,
    S: GraphStore,
{
    gateway: LlmGateway<P>,
    store: S,
    gatekeeper: Gatekeeper,
    segmenter: Segmenter,
    config: PipelineConfig,
}

impl DocumentPipeline<DeepSeekProvider, Neo4jStore> {
    /// Build the production pipeline from environment variables:
    /// DeepSeek for extraction, Neo4j for storage.
    pub async fn from_env(config: PipelineConfig) -> Result<Self, PipelineError> {
        let provider = DeepSeekProvider::from_env()?;
        let store_config =
            StoreConfig::from_env().map_err(|e| PipelineError::StoreUnavailable(e.to_string()))?;
        let store = Neo4jStore::connect(store_config)
            .await
            .map_err(|e| PipelineError::StoreUnavailable(e.to_string()))?;
        store
            .ensure_schema()
            .await
            .map_err(|e| PipelineError::StoreUnavailable(e.to_string()))?;
        Self::new(provider, store, config)
    }
}

impl<P, S> DocumentPipeline<P, S>
where
    P: LlmProvider,
    S: GraphStore,
{
    /// Create a pipeline over the given provider and store.
    pub fn new(provider: P, store: S, config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;
        let segmenter = Segmenter::new(config.max_chunk_size, config.chunk_overlap);
        Ok(Self {
            gateway: LlmGateway::new(provider),
            store,
            gatekeeper: Gatekeeper::default_config(),
            segmenter,
            config,
        })
    }

    /// Replace the default validation vocabularies.
    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.gatekeeper = Gatekeeper::new(validation);
        self
    }

    /// Access the underlying graph store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Access the underlying LLM provider.
    pub fn provider(&self) -> &P {
        self.gateway.provider()
    }

    /// Process one document: segment, extract, validate, merge.
    ///
    /// Every chunk gets exactly one Episode whether or not extraction
    /// succeeded; failed chunks get a summary-less Episode and a
    /// failure record. Returns `Err` only for configuration or store
    /// problems.
    pub async fn process_document(
        &self,
        document_id: &str,
        text: &str,
    ) -> Result<DocumentResult, PipelineError> {
        let chunks = self.segmenter.segment(document_id, text);
        info!(document_id, chunks = chunks.len(), "processing document");

        let mut result = DocumentResult {
            document_id: document_id.to_string(),
            chunks_processed: chunks.len(),
            ..DocumentResult::default()
        };

        for chunk in &chunks {
            self.process_chunk(chunk, &mut result).await?;
        }

        info!(
            document_id,
            entities_created = result.entities_created,
            relationships_created = result.relationships_created,
            episodes = result.episodes_created,
            failed_chunks = result.failures.len(),
            "document processing complete"
        );
        Ok(result)
    }

    async fn process_chunk(
        &self,
        chunk: &Chunk,
        result: &mut DocumentResult,
    ) -> Result<(), PipelineError> {
        debug!(chunk = chunk.index, chars = chunk.len(), "processing chunk");

        let extraction = match self.extract_with_retry(chunk).await {
            Ok(extraction) => extraction,
            Err(e) => {
                warn!(chunk = chunk.index, error = %e, "extraction failed, recording episode without summary");
                self.create_episode(chunk, None).await?;
                result.episodes_created += 1;
                result.failures.push(ChunkFailure {
                    chunk_index: chunk.index,
                    stage: ChunkStage::Extracting,
                    message: e.to_string(),
                });
                return Ok(());
            }
        };

        result.entities_extracted += extraction.entities.len();
        result.relationships_extracted += extraction.relationships.len();

        let summary = if extraction.summary.trim().is_empty() {
            None
        } else {
            Some(extraction.summary.as_str())
        };
        let episode = self.create_episode(chunk, summary).await?;
        result.episodes_created += 1;

        let validated = self.gatekeeper.validate(&extraction);
        if validated.has_rejections() {
            debug!(
                chunk = chunk.index,
                rejected = validated.rejections.len(),
                "validation dropped items"
            );
        }

        let merge = self
            .store
            .merge_entities(&validated.entities, Some(episode))
            .await
            .map_err(|e| PipelineError::StoreUnavailable(e.to_string()))?;
        result.entities_created += merge.created;

        result.relationships_created += self
            .store
            .merge_relationships(&validated.relationships, &merge.id_map)
            .await
            .map_err(|e| PipelineError::StoreUnavailable(e.to_string()))?;

        Ok(())
    }

    /// Run the extraction call, retrying rate-limited failures with
    /// doubling delays up to the configured attempt limit.
    async fn extract_with_retry(&self, chunk: &Chunk) -> Result<Extraction, LlmError> {
        let prompt = PromptBuilder::new(&chunk.content).build();
        let mut delay = self.config.retry_initial_delay();
        let mut attempt = 0;

        loop {
            let messages = vec![ChatMessage::user(prompt.clone())];
            let outcome = self
                .gateway
                .structured::<Extraction>(
                    messages,
                    EXTRACTION_SCHEMA,
                    LlmGateway::<P>::structured_options(),
                )
                .await;

            match outcome {
                Err(e) if e.is_rate_limited() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        chunk = chunk.index,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                other => return other,
            }
        }
    }

    async fn create_episode(
        &self,
        chunk: &Chunk,
        summary: Option<&str>,
    ) -> Result<uuid::Uuid, PipelineError> {
        let name = chunk.episode_name();
        self.store
            .create_episode(NewEpisode {
                name: &name,
                body: &chunk.content,
                summary,
                source_description: &self.config.source_description,
                reference_time_ms: now_ms(),
            })
            .await
            .map_err(|e| PipelineError::StoreUnavailable(e.to_string()))
    }

    /// Aggregate counts over the whole graph.
    pub async fn graph_stats(&self) -> Result<GraphStats, PipelineError> {
        self.store
            .graph_stats()
            .await
            .map_err(|e| PipelineError::StoreUnavailable(e.to_string()))
    }

    /// Probe pipeline dependencies.
    pub async fn health(&self) -> Health {
        match self.store.ping().await {
            Ok(()) => Health { store_connected: true, store_error: None },
            Err(e) => Health { store_connected: false, store_error: Some(e.to_string()) },
        }
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
