//! In-process vector index with cosine similarity and an optional JSON snapshot

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::types::{ScoredRecord, VectorRecord};

use super::vector_store::{UpsertReport, VectorIndex};

/// Cosine similarity; 0.0 when either vector has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    dimensions: usize,
    records: Vec<VectorRecord>,
}

/// Brute-force cosine index keyed by record ID
pub struct MemoryIndex {
    dimensions: usize,
    records: RwLock<HashMap<String, VectorRecord>>,
    snapshot_path: Option<PathBuf>,
    /// Serializes snapshot writers so the temp file has one owner at a time
    persist_lock: Mutex<()>,
}

impl MemoryIndex {
    /// Create an empty, purely in-memory index
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            records: RwLock::new(HashMap::new()),
            snapshot_path: None,
            persist_lock: Mutex::new(()),
        }
    }

    /// Open an index persisted at `path`, starting empty if the file does not exist yet
    pub async fn open(dimensions: usize, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut records = HashMap::new();

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            let raw = tokio::fs::read(&path).await.map_err(|e| {
                Error::index(format!("Failed to read snapshot {}: {}", path.display(), e))
            })?;
            let snapshot: Snapshot = serde_json::from_slice(&raw).map_err(|e| {
                Error::index(format!("Corrupt snapshot {}: {}", path.display(), e))
            })?;
            if snapshot.dimensions != dimensions {
                return Err(Error::config(format!(
                    "snapshot {} holds {}-dimensional vectors, embeddings are configured for {}",
                    path.display(),
                    snapshot.dimensions,
                    dimensions
                )));
            }
            records = snapshot
                .records
                .into_iter()
                .map(|r| (r.id.clone(), r))
                .collect();
            tracing::info!("Loaded {} vectors from {}", records.len(), path.display());
        }

        Ok(Self {
            dimensions,
            records: RwLock::new(records),
            snapshot_path: Some(path),
            persist_lock: Mutex::new(()),
        })
    }

    /// Snapshot location, if persistent
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    async fn persist(&self) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        // Held across serialize, write and rename; the last writer sees every record
        let _guard = self.persist_lock.lock().await;

        let json = {
            let records = self.records.read();
            let mut ordered: Vec<&VectorRecord> = records.values().collect();
            ordered.sort_by(|a, b| a.id.cmp(&b.id));
            serde_json::to_vec(&serde_json::json!({
                "dimensions": self.dimensions,
                "records": ordered,
            }))
            .map_err(|e| Error::index(format!("Failed to serialize snapshot: {}", e)))?
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::index(format!("Failed to create {}: {}", parent.display(), e)))?;
        }

        // Write then rename so a crash never leaves a truncated snapshot
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| Error::index(format!("Failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| Error::index(format!("Failed to replace {}: {}", path.display(), e)))?;

        Ok(())
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<UpsertReport> {
        if let Some(bad) = records.iter().find(|r| r.vector.len() != self.dimensions) {
            return Err(Error::index(format!(
                "record {} has {} dimensions, index expects {}",
                bad.id,
                bad.vector.len(),
                self.dimensions
            )));
        }

        let count = records.len();
        {
            let mut stored = self.records.write();
            for record in records {
                stored.insert(record.id.clone(), record);
            }
        }

        if let Err(e) = self.persist().await {
            return Ok(UpsertReport::partial(count, e.to_string()));
        }

        tracing::debug!("Upserted {} vectors into memory index", count);
        Ok(UpsertReport::complete(count))
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>> {
        if vector.len() != self.dimensions {
            return Err(Error::index(format!(
                "query has {} dimensions, index expects {}",
                vector.len(),
                self.dimensions
            )));
        }

        let records = self.records.read();
        let mut scored: Vec<ScoredRecord> = records
            .values()
            .map(|record| ScoredRecord {
                score: cosine_similarity(vector, &record.vector),
                record: record.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.record.id.cmp(&b.record.id))
        });
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.records.read().len())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
