//! Response types returned to callers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source text reported when retrieval found nothing
pub const NO_SOURCE_FOUND: &str = "No source document found";

/// Answer to a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Generated response
    pub text: String,
    /// Text of the top-ranked supporting chunk, or [`NO_SOURCE_FOUND`]
    pub source: String,
}

impl Answer {
    /// Create an answer citing a source chunk
    pub fn new(text: String, source: String) -> Self {
        Self { text, source }
    }

    /// Create an answer generated without any retrieved context
    pub fn ungrounded(text: String) -> Self {
        Self {
            text,
            source: NO_SOURCE_FOUND.to_string(),
        }
    }

    /// Whether a source chunk backs this answer
    pub fn has_source(&self) -> bool {
        self.source != NO_SOURCE_FOUND
    }
}

/// Outcome of an ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStatus {
    /// Every chunk was embedded and stored
    Success,
}

/// Result of ingesting one PDF
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResult {
    /// File that was ingested
    pub file_name: String,
    /// Pages with extractable text
    pub page_count: usize,
    /// Records upserted into the vector index
    pub chunk_count: usize,
    /// Outcome
    pub status: IngestStatus,
    /// Human-readable message
    pub message: String,
    /// Completion time
    pub ingested_at: DateTime<Utc>,
}

impl IngestResult {
    /// Create a successful result
    pub fn success(file_name: impl Into<String>, page_count: usize, chunk_count: usize) -> Self {
        Self {
            file_name: file_name.into(),
            page_count,
            chunk_count,
            status: IngestStatus::Success,
            message: "pdf is loaded".to_string(),
            ingested_at: Utc::now(),
        }
    }
}
