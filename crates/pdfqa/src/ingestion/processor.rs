//! Ingestion pipeline orchestration: load, chunk, embed, upsert

use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::PdfQaConfig;
use crate::error::{Error, Result};
use crate::providers::{DocumentLoader, EmbeddingProvider, IndexHandle};
use crate::types::query::validate_file_name;
use crate::types::{Chunk, Document, IngestResult, VectorRecord};

use super::chunker::TextChunker;

/// Settings for one ingestion pipeline
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Directory file names are resolved against
    pub documents_dir: PathBuf,
    /// Longest accepted file name
    pub max_file_name_chars: usize,
    /// Texts per embedding request
    pub batch_size: usize,
    /// Embedding batches in flight
    pub concurrency: usize,
}

impl IngestSettings {
    /// Settings from configuration
    pub fn from_config(config: &PdfQaConfig) -> Self {
        Self {
            documents_dir: config.documents.dir.clone(),
            max_file_name_chars: config.documents.max_file_name_chars,
            batch_size: config.embeddings.batch_size.max(1),
            concurrency: config.embeddings.concurrency.max(1),
        }
    }
}

/// Main ingestion pipeline
pub struct IngestPipeline {
    settings: IngestSettings,
    chunker: TextChunker,
    loader: Arc<dyn DocumentLoader>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: IndexHandle,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(
        settings: IngestSettings,
        chunker: TextChunker,
        loader: Arc<dyn DocumentLoader>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: IndexHandle,
    ) -> Self {
        Self {
            settings,
            chunker,
            loader,
            embedder,
            index,
        }
    }

    /// Resolve a bare file name against the documents directory
    pub fn resolve(&self, file_name: &str) -> Result<PathBuf> {
        validate_file_name(file_name, self.settings.max_file_name_chars)?;
        Ok(self.settings.documents_dir.join(file_name))
    }

    /// Ingest one PDF from the documents directory
    pub async fn ingest(&self, file_name: &str) -> Result<IngestResult> {
        let path = self.resolve(file_name)?;

        if !is_file(&path).await {
            return Err(Error::NotFound(file_name.to_string()));
        }

        let index = self.index.get()?;

        tracing::info!("Ingesting {}", path.display());

        let pages = self.loader.load(&path).await?;
        if pages.is_empty() {
            return Err(Error::load(file_name, "no pages with extractable text"));
        }
        let doc = Document::new(file_name, pages);

        let chunks = self.chunker.chunk_document(&doc);
        tracing::info!(
            "{}: {} pages, {} characters, {} chunks",
            file_name,
            doc.pages.len(),
            doc.char_count(),
            chunks.len()
        );
        if chunks.is_empty() {
            return Err(Error::load(file_name, "no pages with extractable text"));
        }

        let records = self.embed_chunks(chunks).await?;
        let total = records.len();

        let report = index.upsert(records).await?;
        if let Some(failure) = report.failure {
            tracing::error!(
                "{}: upsert stopped after {} of {} records: {}",
                file_name,
                report.stored,
                total,
                failure
            );
            return Err(Error::Embedding {
                message: format!("vector index stored {} of {} records", report.stored, total),
                stored: report.stored,
            });
        }

        tracing::info!("{}: stored {} vectors in {}", file_name, total, index.name());

        Ok(IngestResult::success(file_name, doc.pages.len(), total))
    }

    /// Embed chunks in batches with bounded concurrency, preserving chunk order
    async fn embed_chunks(&self, chunks: Vec<Chunk>) -> Result<Vec<VectorRecord>> {
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency));
        let dimensions = self.embedder.dimensions();

        let batches: Vec<Vec<Chunk>> = chunks
            .chunks(self.settings.batch_size)
            .map(|batch| batch.to_vec())
            .collect();

        tracing::debug!(
            "Embedding {} batches with {} ({} in flight)",
            batches.len(),
            self.embedder.name(),
            self.settings.concurrency
        );

        let futures = batches.into_iter().map(|batch| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore
                    .acquire()
                    .await
                    .map_err(|e| Error::embedding(format!("embedding pool closed: {}", e)))?;

                let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
                let vectors = self.embedder.embed_batch(&texts).await.map_err(|e| match e {
                    Error::Embedding { .. } => e,
                    other => Error::embedding(other.to_string()),
                })?;

                crate::providers::embedding::check_batch(
                    self.embedder.name(),
                    batch.len(),
                    dimensions,
                    &vectors,
                )?;

                Ok::<_, Error>(
                    batch
                        .into_iter()
                        .zip(vectors)
                        .map(|(chunk, vector)| VectorRecord::from_chunk(chunk, vector))
                        .collect::<Vec<_>>(),
                )
            }
        });

        let mut records = Vec::new();
        for result in join_all(futures).await {
            records.extend(result?);
        }
        Ok(records)
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
