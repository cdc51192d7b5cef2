//! Chunk - a bounded text segment produced by the segmenter

/// One ordered segment of a source document.
///
/// Chunks are ephemeral: they live for a single pipeline pass and are
/// never persisted themselves. The Episode node created during merge
/// carries the chunk body as provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position of this chunk within the document
    pub index: usize,

    /// Segment text. Never empty or whitespace-only.
    pub content: String,

    /// Identifier of the source document this chunk came from
    pub document_id: String,
}

impl Chunk {
    /// Create a new chunk.
    pub fn new(index: usize, content: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self {
            index,
            content: content.into(),
            document_id: document_id.into(),
        }
    }

    /// Character length of the chunk content.
    pub fn len(&self) -> usize {
        self.content.chars().count()
    }

    /// Whether the chunk holds no content.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Name used for the Episode node backing this chunk,
    /// e.g. `"doc_001_chunk_3"`.
    pub fn episode_name(&self) -> String {
        format!("{}_chunk_{}", self.document_id, self.index + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_name_is_one_based() {
        let chunk = Chunk::new(0, "some text", "doc_001");
        assert_eq!(chunk.episode_name(), "doc_001_chunk_1");
    }

    #[test]
    fn test_len_counts_chars_not_bytes() {
        let chunk = Chunk::new(0, "桥梁工程", "doc");
        assert_eq!(chunk.len(), 4);
    }
}
