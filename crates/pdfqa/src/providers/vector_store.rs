//! Vector index trait for storing and searching embeddings

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ScoredRecord, VectorRecord};

/// Outcome of an upsert
///
/// Remote indexes accept records in batches, so a failure part-way through
/// leaves earlier batches stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertReport {
    /// Records acknowledged by the index
    pub stored: usize,
    /// Error that stopped the upsert, if any
    pub failure: Option<String>,
}

impl UpsertReport {
    /// Every record was stored
    pub fn complete(stored: usize) -> Self {
        Self {
            stored,
            failure: None,
        }
    }

    /// Upsert stopped after `stored` records
    pub fn partial(stored: usize, failure: impl Into<String>) -> Self {
        Self {
            stored,
            failure: Some(failure.into()),
        }
    }

    /// Whether every record was stored
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `MemoryIndex`: in-process cosine index with an optional JSON snapshot
/// - `PineconeIndex`: Pinecone data plane over REST
///
/// Records are keyed by ID: upserting an existing ID replaces the record.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace records
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<UpsertReport>;

    /// Return up to `top_k` records nearest to `vector`, best first
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>>;

    /// Get total number of vectors stored
    async fn len(&self) -> Result<usize>;

    /// Check if index is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Check if the index is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}
