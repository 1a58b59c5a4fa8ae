//! Document, page, chunk and vector record types with provenance tracking

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// A single page of extracted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Raw extracted text
    pub text: String,
}

impl Page {
    /// Create a page
    pub fn new(page_number: u32, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }
}

/// A loaded document: a file name and its ordered pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// File name the caller referenced
    pub filename: String,
    /// Pages in document order
    pub pages: Vec<Page>,
}

impl Document {
    /// Create a document
    pub fn new(filename: impl Into<String>, pages: Vec<Page>) -> Self {
        Self {
            filename: filename.into(),
            pages,
        }
    }

    /// Total characters across all pages
    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}

/// Where a chunk came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSource {
    /// Source document file name
    pub filename: String,
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Character offset of the chunk within its page
    pub char_offset: usize,
    /// Ordinal of the chunk within the document
    pub chunk_index: u32,
}

impl ChunkSource {
    /// Format source for display
    pub fn format_citation(&self) -> String {
        format!("{}, Page {}", self.filename, self.page_number)
    }

    /// Convert to vector metadata for storage
    pub fn to_metadata(&self) -> HashMap<String, Value> {
        let mut meta = HashMap::new();
        meta.insert("filename".to_string(), serde_json::json!(self.filename));
        meta.insert("page_number".to_string(), serde_json::json!(self.page_number));
        meta.insert("char_offset".to_string(), serde_json::json!(self.char_offset));
        meta.insert("chunk_index".to_string(), serde_json::json!(self.chunk_index));
        meta
    }

    /// Rebuild provenance from stored metadata, tolerating missing fields
    pub fn from_metadata(metadata: &HashMap<String, Value>) -> Self {
        let filename = metadata
            .get("filename")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();

        let page_number = metadata
            .get("page_number")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;

        let char_offset = metadata
            .get("char_offset")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;

        let chunk_index = metadata
            .get("chunk_index")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as u32;

        Self {
            filename,
            page_number,
            char_offset,
            chunk_index,
        }
    }
}

/// A bounded excerpt of page text; the unit of embedding and retrieval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Content-addressed ID
    pub id: String,
    /// Text content
    pub content: String,
    /// Provenance
    pub source: ChunkSource,
}

impl Chunk {
    /// Create a chunk; its ID is derived from provenance and content
    pub fn new(content: String, source: ChunkSource) -> Self {
        let id = Self::derive_id(&content, &source);
        Self {
            id,
            content,
            source,
        }
    }

    /// SHA-256 over file name, page, offset and text, truncated to 32 hex chars
    pub fn derive_id(content: &str, source: &ChunkSource) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.filename.as_bytes());
        hasher.update([0u8]);
        hasher.update(source.page_number.to_be_bytes());
        hasher.update((source.char_offset as u64).to_be_bytes());
        hasher.update(content.as_bytes());
        let digest = hex::encode(hasher.finalize());
        digest[..32].to_string()
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// A chunk with its embedding, as stored in the vector index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Chunk ID
    pub id: String,
    /// Embedding vector
    pub vector: Vec<f32>,
    /// Chunk text
    pub text: String,
    /// Provenance
    pub metadata: ChunkSource,
}

impl VectorRecord {
    /// Pair a chunk with its embedding
    pub fn from_chunk(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self {
            id: chunk.id,
            vector,
            text: chunk.content,
            metadata: chunk.source,
        }
    }
}

/// A record returned from a similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// The matched record
    pub record: VectorRecord,
    /// Similarity score (higher is more similar)
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(offset: usize) -> ChunkSource {
        ChunkSource {
            filename: "contract.pdf".to_string(),
            page_number: 2,
            char_offset: offset,
            chunk_index: 0,
        }
    }

    #[test]
    fn test_chunk_id_is_content_addressed() {
        let a = Chunk::new("termination clause".to_string(), source(0));
        let b = Chunk::new("termination clause".to_string(), source(0));
        let moved = Chunk::new("termination clause".to_string(), source(10));
        let edited = Chunk::new("termination clauses".to_string(), source(0));

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, moved.id);
        assert_ne!(a.id, edited.id);
        assert_eq!(a.id.len(), 32);
    }

    #[test]
    fn test_metadata_roundtrip_tolerates_missing_fields() {
        let original = source(42);
        let restored = ChunkSource::from_metadata(&original.to_metadata());
        assert_eq!(restored, original);

        let empty = ChunkSource::from_metadata(&HashMap::new());
        assert_eq!(empty.filename, "unknown");
        assert_eq!(empty.page_number, 0);
    }

    #[test]
    fn test_char_len_counts_characters() {
        let chunk = Chunk::new("Kündigung".to_string(), source(0));
        assert_eq!(chunk.char_len(), 9);
        assert!(chunk.content.len() > 9);
    }
}
