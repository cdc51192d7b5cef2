//! Result and status types for document processing

/// Per-chunk processing stage.
///
/// A chunk moves `Pending → Extracting → Validating → Merging → Done`;
/// any stage can transition to `Failed` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStage {
    /// Not started
    Pending,
    /// Waiting on the LLM extraction call
    Extracting,
    /// Filtering raw extraction output
    Validating,
    /// Writing to the graph store
    Merging,
    /// Completed successfully
    Done,
    /// Abandoned after an unrecoverable error
    Failed,
}

impl std::fmt::Display for ChunkStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChunkStage::Pending => "pending",
            ChunkStage::Extracting => "extracting",
            ChunkStage::Validating => "validating",
            ChunkStage::Merging => "merging",
            ChunkStage::Done => "done",
            ChunkStage::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One chunk that did not make it to `Done`
#[derive(Debug, Clone)]
pub struct ChunkFailure {
    /// Zero-based chunk index within the document
    pub chunk_index: usize,
    /// Stage the chunk was in when it failed
    pub stage: ChunkStage,
    /// Failure detail
    pub message: String,
}

/// Aggregate outcome of processing one document
#[derive(Debug, Clone, Default)]
pub struct DocumentResult {
    /// Document identifier the caller supplied
    pub document_id: String,
    /// How many chunks the segmenter produced
    pub chunks_processed: usize,
    /// Entities in raw extraction output, before validation
    pub entities_extracted: usize,
    /// Entity nodes newly created in the graph
    pub entities_created: usize,
    /// Relationships in raw extraction output, before validation
    pub relationships_extracted: usize,
    /// Relationship edges newly created in the graph
    pub relationships_created: usize,
    /// Episode nodes created
    pub episodes_created: usize,
    /// Chunks that failed, with stage and reason
    pub failures: Vec<ChunkFailure>,
}

impl DocumentResult {
    /// Whether every chunk completed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of a pipeline health probe
#[derive(Debug, Clone)]
pub struct Health {
    /// Whether the graph store answered the connectivity probe
    pub store_connected: bool,
    /// Probe failure detail, when disconnected
    pub store_error: Option<String>,
}

impl Health {
    /// Whether the pipeline can accept documents.
    pub fn available(&self) -> bool {
        self.store_connected
    }
}
