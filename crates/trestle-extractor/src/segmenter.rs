//! Document segmentation
//!
//! Splits a document into bounded, ordered chunks along paragraph and
//! sentence boundaries. Sentences never straddle a chunk boundary
//! unless a single sentence alone exceeds the chunk size, in which case
//! it is hard-split with a small overlap between the pieces.

use trestle_domain::Chunk;

/// Sentence terminators, ASCII and CJK.
const SENTENCE_TERMINATORS: [char; 6] = ['.', '!', '?', '。', '！', '？'];

/// Splits documents into bounded chunks
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    max_chunk_size: usize,
    overlap: usize,
}

impl Segmenter {
    /// Create a segmenter. `max_chunk_size` and `overlap` are in
    /// characters; `overlap` must be smaller than `max_chunk_size`.
    pub fn new(max_chunk_size: usize, overlap: usize) -> Self {
        Self { max_chunk_size, overlap }
    }

    /// Segment a document into chunks.
    ///
    /// Every chunk is at most `max_chunk_size` characters and never
    /// empty. Whitespace-only input yields no chunks.
    pub fn segment(&self, document_id: &str, text: &str) -> Vec<Chunk> {
        let mut contents: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for paragraph in text.split("\n\n") {
            let mut first_in_paragraph = true;
            for sentence in split_sentences(paragraph) {
                let sentence_len = sentence.chars().count();

                if sentence_len > self.max_chunk_size {
                    if !current.is_empty() {
                        contents.push(std::mem::take(&mut current));
                        current_len = 0;
                    }
                    contents.extend(self.hard_split(&sentence));
                    first_in_paragraph = true;
                    continue;
                }

                // Paragraph breaks cost two chars, sentence joins one.
                let joiner_len = if current.is_empty() {
                    0
                } else if first_in_paragraph {
                    2
                } else {
                    1
                };

                if current_len + joiner_len + sentence_len > self.max_chunk_size {
                    contents.push(std::mem::take(&mut current));
                    current_len = 0;
                } else if !current.is_empty() {
                    current.push_str(if first_in_paragraph { "\n\n" } else { " " });
                    current_len += joiner_len;
                }
                current.push_str(&sentence);
                current_len += sentence_len;
                first_in_paragraph = false;
            }
        }
        if !current.is_empty() {
            contents.push(current);
        }

        contents
            .into_iter()
            .enumerate()
            .map(|(index, content)| Chunk {
                index,
                content,
                document_id: document_id.to_string(),
            })
            .collect()
    }

    /// Split an oversized sentence into max-sized pieces, each after
    /// the first starting `overlap` characters before the previous
    /// piece ended.
    fn hard_split(&self, sentence: &str) -> Vec<String> {
        let chars: Vec<char> = sentence.chars().collect();
        let mut pieces = Vec::new();
        let mut start = 0usize;
        loop {
            let end = (start + self.max_chunk_size).min(chars.len());
            pieces.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start = end - self.overlap;
        }
        pieces
    }
}

/// Split a paragraph into trimmed sentences, breaking after sentence
/// terminators and at newlines. Terminators stay attached.
fn split_sentences(paragraph: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    let mut flush = |current: &mut String| {
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            sentences.push(trimmed.to_string());
        }
        current.clear();
    };

    for c in paragraph.chars() {
        if c == '\n' {
            flush(&mut current);
            continue;
        }
        current.push(c);
        if SENTENCE_TERMINATORS.contains(&c) {
            flush(&mut current);
        }
    }
    flush(&mut current);
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn non_whitespace(s: &str) -> Vec<char> {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn test_empty_and_whitespace_input_yield_no_chunks() {
        let segmenter = Segmenter::new(3_000, 100);
        assert!(segmenter.segment("doc", "").is_empty());
        assert!(segmenter.segment("doc", "  \n\n \t ").is_empty());
    }

    #[test]
    fn test_small_document_is_one_chunk() {
        let segmenter = Segmenter::new(3_000, 100);
        let chunks = segmenter.segment("doc_001", "The girder uses S355 steel.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].document_id, "doc_001");
        assert_eq!(chunks[0].content, "The girder uses S355 steel.");
    }

    #[test]
    fn test_chunks_respect_size_limit() {
        let segmenter = Segmenter::new(80, 10);
        let text = "First sentence here. Second sentence here. Third one. Fourth sentence now. \
                    Fifth sentence closes it out.";
        let chunks = segmenter.segment("doc", text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 80);
            assert!(!chunk.content.is_empty());
        }
    }

    #[test]
    fn test_sentences_do_not_straddle_chunks() {
        let segmenter = Segmenter::new(50, 10);
        let text = "Alpha beam holds the deck. Beta pier carries load. Gamma cable anchors it.";
        let chunks = segmenter.segment("doc", text);
        for chunk in &chunks {
            // Each chunk ends where a sentence ended.
            assert!(chunk.content.ends_with('.'), "chunk {:?} splits a sentence", chunk.content);
        }
    }

    #[test]
    fn test_oversized_sentence_hard_split_with_overlap() {
        let segmenter = Segmenter::new(3_000, 100);
        let text = "x".repeat(4_000);
        let chunks = segmenter.segment("doc", &text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content.chars().count(), 3_000);
        // Second piece starts 100 chars before the first ended.
        assert_eq!(chunks[1].content.chars().count(), 4_000 - 2_900);
    }

    #[test]
    fn test_long_paragraphs_split_under_limit() {
        let segmenter = Segmenter::new(3_000, 100);
        let long = format!("{}. {}.", "a".repeat(2_000), "b".repeat(1_997));
        let short = format!("{}.", "c".repeat(199));
        let text = format!("{long}\n\n{short}");

        let chunks = segmenter.segment("doc", &text);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 3_000);
        }
    }

    #[test]
    fn test_indices_are_ordered_and_dense() {
        let segmenter = Segmenter::new(30, 5);
        let text = "One sentence. Two sentence. Red sentence. Blue sentence.";
        let chunks = segmenter.segment("doc", text);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    #[test]
    fn test_all_content_preserved_in_order() {
        let segmenter = Segmenter::new(60, 10);
        let text = "The deck sits on piers.\n\nEach pier is founded on piles. \
                    Piles reach bedrock at twelve meters. 桥面由主梁承载。";
        let chunks = segmenter.segment("doc", text);

        let original = non_whitespace(text);
        let joined: String = chunks.iter().map(|c| c.content.as_str()).collect();
        let rebuilt = non_whitespace(&joined);

        // Every original non-whitespace char appears, in order
        // (hard-split overlap may duplicate, never reorder or drop).
        let mut pos = 0;
        for c in &original {
            match rebuilt[pos..].iter().position(|r| r == c) {
                Some(offset) => pos += offset + 1,
                None => panic!("char {c:?} lost during segmentation"),
            }
        }
    }
}
