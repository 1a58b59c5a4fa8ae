//! Recursive character text splitting with page and offset tracking
//!
//! Splits prefer the coarsest boundary available inside the window: paragraph
//! breaks, then sentence ends, then whitespace, then a raw character cut.
//! Consecutive chunks of a page share exactly `overlap` characters: every chunk
//! after the first starts `overlap` characters before the previous one ended.
//! Sizes and offsets are measured in `char`s, not bytes.

use crate::error::{Error, Result};
use crate::types::{Chunk, ChunkSource, Document, Page};

/// Boundary kinds, coarsest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Separator {
    /// Blank line
    Paragraph,
    /// `.`, `!` or `?` followed by whitespace
    Sentence,
    /// Any whitespace character
    Whitespace,
}

const SEPARATORS: &[Separator] = &[
    Separator::Paragraph,
    Separator::Sentence,
    Separator::Whitespace,
];

impl Separator {
    /// Whether a cut at `end` (exclusive) falls right after this separator
    fn ends_at(self, chars: &[char], end: usize) -> bool {
        match self {
            Separator::Paragraph => end >= 2 && chars[end - 1] == '\n' && chars[end - 2] == '\n',
            Separator::Sentence => {
                end >= 2
                    && chars[end - 1].is_whitespace()
                    && matches!(chars[end - 2], '.' | '!' | '?')
            }
            Separator::Whitespace => end >= 1 && chars[end - 1].is_whitespace(),
        }
    }

    /// Latest cut position in `lo..=hi` that ends on this separator
    fn last_cut(self, chars: &[char], lo: usize, hi: usize) -> Option<usize> {
        (lo..=hi).rev().find(|&end| self.ends_at(chars, end))
    }
}

/// A piece of text and its character offset within the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    /// Character offset of the segment start
    pub offset: usize,
    /// Segment text
    pub text: String,
}

/// Text chunker with configurable size and overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Characters shared by consecutive chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::config("chunk size must be positive"));
        }
        if overlap >= chunk_size {
            return Err(Error::config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Maximum chunk size in characters
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Overlap in characters
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split raw text into overlapping segments
    pub fn split(&self, text: &str) -> Vec<TextSegment> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();

        if total <= self.chunk_size {
            return vec![TextSegment {
                offset: 0,
                text: text.to_string(),
            }];
        }

        // A cut earlier than this would leave a chunk less than half full or
        // fail to advance past the overlap.
        let min_fill = (self.overlap + 1).max((self.chunk_size + 1) / 2);

        let mut segments = Vec::new();
        let mut start = 0usize;

        loop {
            if total - start <= self.chunk_size {
                segments.push(segment(&chars, start, total));
                break;
            }

            let hi = start + self.chunk_size;
            let lo = start + min_fill;
            let end = find_cut(&chars, lo, hi, SEPARATORS);

            segments.push(segment(&chars, start, end));
            start = end - self.overlap;
        }

        segments
    }

    /// Chunk one page, numbering chunks from `start_index`
    pub fn chunk_page(&self, filename: &str, page: &Page, start_index: u32) -> Vec<Chunk> {
        self.split(&page.text)
            .into_iter()
            .enumerate()
            .map(|(i, seg)| {
                let source = ChunkSource {
                    filename: filename.to_string(),
                    page_number: page.page_number,
                    char_offset: seg.offset,
                    chunk_index: start_index + i as u32,
                };
                Chunk::new(seg.text, source)
            })
            .collect()
    }

    /// Chunk every page of a document, preserving page order
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for page in &doc.pages {
            let page_chunks = self.chunk_page(&doc.filename, page, chunks.len() as u32);
            tracing::debug!(
                "{} page {}: {} chunks",
                doc.filename,
                page.page_number,
                page_chunks.len()
            );
            chunks.extend(page_chunks);
        }

        chunks
    }
}

/// Split text with the given size and overlap
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<TextSegment>> {
    Ok(TextChunker::new(chunk_size, overlap)?.split(text))
}

/// Pick a cut in `lo..=hi`, descending to finer separators when a coarser one has no match
fn find_cut(chars: &[char], lo: usize, hi: usize, separators: &[Separator]) -> usize {
    match separators.split_first() {
        Some((separator, finer)) => separator
            .last_cut(chars, lo, hi)
            .unwrap_or_else(|| find_cut(chars, lo, hi, finer)),
        None => hi,
    }
}

fn segment(chars: &[char], start: usize, end: usize) -> TextSegment {
    TextSegment {
        offset: start,
        text: chars[start..end].iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sentence_text(len: usize) -> String {
        "The tenant may terminate this lease with notice. "
            .chars()
            .cycle()
            .take(len)
            .collect()
    }

    fn assert_exact_overlap(segments: &[TextSegment], overlap: usize) {
        for pair in segments.windows(2) {
            let prev: Vec<char> = pair[0].text.chars().collect();
            let next: Vec<char> = pair[1].text.chars().collect();
            assert_eq!(&prev[prev.len() - overlap..], &next[..overlap]);
            assert_eq!(pair[1].offset, pair[0].offset + prev.len() - overlap);
        }
    }

    #[test]
    fn test_empty_text() {
        let chunker = TextChunker::new(1000, 50).unwrap();
        assert!(chunker.split("").is_empty());
        assert!(chunker.split("  \n\n \t").is_empty());
    }

    #[test]
    fn test_small_text_is_single_chunk() {
        let chunker = TextChunker::new(1000, 50).unwrap();
        let text = sentence_text(400);
        let segments = chunker.split(&text);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].offset, 0);
        assert_eq!(segments[0].text, text);
    }

    #[test]
    fn test_exact_size_is_single_chunk() {
        let chunker = TextChunker::new(100, 10).unwrap();
        let text = "x".repeat(100);
        assert_eq!(chunker.split(&text).len(), 1);
    }

    #[test]
    fn test_long_page_chunking() {
        let chunker = TextChunker::new(1000, 50).unwrap();
        let segments = chunker.split(&sentence_text(2400));

        assert_eq!(segments.len(), 3);
        assert!(segments.iter().all(|s| s.text.chars().count() <= 1000));
        assert_exact_overlap(&segments, 50);
    }

    #[test]
    fn test_prefers_paragraph_breaks() {
        let chunker = TextChunker::new(100, 0).unwrap();
        let first = "a".repeat(70);
        let text = format!("{}\n\n{}", first, "b ".repeat(60));
        let segments = chunker.split(&text);

        assert_eq!(segments[0].text, format!("{}\n\n", first));
    }

    #[test]
    fn test_prefers_sentence_over_word_breaks() {
        let chunker = TextChunker::new(60, 5).unwrap();
        let text = "First sentence is here and it is long enough. Second one keeps going on and on without a stop";
        let segments = chunker.split(text);

        assert_eq!(segments[0].text, "First sentence is here and it is long enough. ");
        assert_exact_overlap(&segments, 5);
    }

    #[test]
    fn test_falls_back_to_raw_characters() {
        let chunker = TextChunker::new(10, 2).unwrap();
        let text = "abcdefghijklmnopqrstuvwxyz";
        let segments = chunker.split(text);

        assert_eq!(segments[0].text, "abcdefghij");
        assert_eq!(segments[1].text, "ijklmnopqr");
        assert_exact_overlap(&segments, 2);
    }

    #[test]
    fn test_multibyte_characters() {
        let chunker = TextChunker::new(10, 3).unwrap();
        let text = "äöüßéèêëïî".repeat(5);
        let segments = chunker.split(&text);

        assert!(segments.iter().all(|s| s.text.chars().count() <= 10));
        assert_exact_overlap(&segments, 3);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(TextChunker::new(0, 0).is_err());
        assert!(TextChunker::new(100, 100).is_err());
        assert!(split_text("abc", 10, 20).is_err());
    }

    #[test]
    fn test_chunk_document_keeps_page_order_and_provenance() {
        let chunker = TextChunker::new(1000, 50).unwrap();
        let doc = Document::new(
            "lease.pdf",
            vec![Page::new(1, sentence_text(2400)), Page::new(2, sentence_text(400))],
        );
        let chunks = chunker.chunk_document(&doc);

        assert_eq!(chunks.len(), 4);
        let pages: Vec<u32> = chunks.iter().map(|c| c.source.page_number).collect();
        assert_eq!(pages, vec![1, 1, 1, 2]);
        let indexes: Vec<u32> = chunks.iter().map(|c| c.source.chunk_index).collect();
        assert_eq!(indexes, vec![0, 1, 2, 3]);
        assert_eq!(chunks[3].source.char_offset, 0);
        assert!(chunks.iter().all(|c| c.source.filename == "lease.pdf"));
    }

    proptest! {
        #[test]
        fn prop_chunks_are_bounded_and_overlap_exactly(
            text in "[a-z .!?\n]{0,2000}",
            chunk_size in 10usize..300,
            overlap_pct in 0usize..100,
        ) {
            let overlap = overlap_pct * (chunk_size - 1) / 100;
            let chunker = TextChunker::new(chunk_size, overlap).unwrap();
            let segments = chunker.split(&text);

            for seg in &segments {
                prop_assert!(seg.text.chars().count() <= chunk_size);
            }
            for pair in segments.windows(2) {
                let prev: Vec<char> = pair[0].text.chars().collect();
                let next: Vec<char> = pair[1].text.chars().collect();
                prop_assert_eq!(&prev[prev.len() - overlap..], &next[..overlap]);
            }

            // Dropping each overlap reconstructs the page
            if !text.trim().is_empty() {
                let mut rebuilt: String = segments[0].text.clone();
                for seg in &segments[1..] {
                    rebuilt.extend(seg.text.chars().skip(overlap));
                }
                prop_assert_eq!(rebuilt, text.clone());
            }

            prop_assert_eq!(chunker.split(&text), segments);
        }
    }
}
