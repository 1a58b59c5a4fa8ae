//! Chat service facade: owns the provider set and the index handle

use serde::Serialize;
use std::sync::Arc;

use crate::config::{IndexBackend, PdfQaConfig, ProviderBackend};
use crate::error::Result;
use crate::ingestion::{IngestPipeline, IngestSettings, PdfLoader, TextChunker};
use crate::providers::{
    ollama::ollama_pair, openai::openai_pair, DocumentLoader, EmbeddingProvider, IndexHandle,
    LanguageModel, MemoryIndex, OllamaEmbedder, OllamaLlm, OpenAiChat, OpenAiEmbedder,
    PineconeIndex, VectorIndex,
};
use crate::retrieval::{QaPipeline, QaSettings};
use crate::types::{Answer, IngestResult};

/// Providers the service is built from
pub struct Providers {
    /// Document loader
    pub loader: Arc<dyn DocumentLoader>,
    /// Embedding provider shared by both pipelines
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// Answer generator
    pub llm: Arc<dyn LanguageModel>,
}

impl Providers {
    /// Build the configured backends
    pub fn from_config(config: &PdfQaConfig) -> Result<Self> {
        let dimensions = config.embeddings.dimensions;
        let embedding = config.embeddings.provider;
        let llm = config.llm.provider;

        let (embedder, llm): (Arc<dyn EmbeddingProvider>, Arc<dyn LanguageModel>) =
            match (embedding, llm) {
                (ProviderBackend::Ollama, ProviderBackend::Ollama) => {
                    let (e, l) = ollama_pair(&config.ollama, dimensions)?;
                    (Arc::new(e), Arc::new(l))
                }
                (ProviderBackend::OpenAi, ProviderBackend::OpenAi) => {
                    let (e, l) = openai_pair(&config.openai, dimensions)?;
                    (Arc::new(e), Arc::new(l))
                }
                (ProviderBackend::Ollama, ProviderBackend::OpenAi) => (
                    Arc::new(OllamaEmbedder::new(&config.ollama, dimensions)?),
                    Arc::new(OpenAiChat::new(&config.openai)?),
                ),
                (ProviderBackend::OpenAi, ProviderBackend::Ollama) => (
                    Arc::new(OpenAiEmbedder::new(&config.openai, dimensions)?),
                    Arc::new(OllamaLlm::new(&config.ollama)?),
                ),
            };

        tracing::info!(
            "Providers: embeddings={} ({} dims), llm={} ({})",
            embedder.name(),
            dimensions,
            llm.name(),
            llm.model()
        );

        Ok(Self {
            loader: Arc::new(PdfLoader::new()),
            embedder,
            llm,
        })
    }
}

/// Reachability of each provider
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Embedding provider reachable
    pub embeddings: bool,
    /// Language model reachable
    pub llm: bool,
    /// Vector index initialized and reachable
    pub index: bool,
}

impl HealthReport {
    /// Whether every provider is healthy
    pub fn all_healthy(&self) -> bool {
        self.embeddings && self.llm && self.index
    }
}

/// Entry point for the outer layers: `ingest` and `answer`
pub struct ChatService {
    config: PdfQaConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LanguageModel>,
    index: IndexHandle,
    ingest: IngestPipeline,
    qa: QaPipeline,
}

impl ChatService {
    /// Wire the pipelines around explicit providers and an index handle
    pub fn new(config: PdfQaConfig, providers: Providers, index: IndexHandle) -> Result<Self> {
        let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;

        let ingest = IngestPipeline::new(
            IngestSettings::from_config(&config),
            chunker,
            Arc::clone(&providers.loader),
            Arc::clone(&providers.embedder),
            index.clone(),
        );
        let qa = QaPipeline::new(
            QaSettings::from_config(&config),
            Arc::clone(&providers.embedder),
            Arc::clone(&providers.llm),
            index.clone(),
        );

        Ok(Self {
            config,
            embedder: providers.embedder,
            llm: providers.llm,
            index,
            ingest,
            qa,
        })
    }

    /// Build providers from configuration and connect the index
    pub async fn from_config(config: PdfQaConfig) -> Result<Self> {
        let providers = Providers::from_config(&config)?;
        let service = Self::new(config, providers, IndexHandle::new())?;
        service.connect().await?;
        Ok(service)
    }

    /// Initialize the vector index (no-op when already connected)
    pub async fn connect(&self) -> Result<Arc<dyn VectorIndex>> {
        let config = &self.config;
        self.index
            .init(|| async move { connect_index(config).await })
            .await
    }

    /// Ingest a PDF from the documents directory
    pub async fn ingest(&self, file_name: &str) -> Result<IngestResult> {
        self.ingest.ingest(file_name).await
    }

    /// Answer a question from indexed documents
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        self.qa.answer(question).await
    }

    /// Whether the index handle is initialized
    pub fn is_ready(&self) -> bool {
        self.index.is_ready()
    }

    /// Check every provider; unreachable ones report `false`
    pub async fn health(&self) -> HealthReport {
        let index = match self.index.get() {
            Ok(index) => index.health_check().await.unwrap_or(false),
            Err(_) => false,
        };
        HealthReport {
            embeddings: self.embedder.health_check().await.unwrap_or(false),
            llm: self.llm.health_check().await.unwrap_or(false),
            index,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &PdfQaConfig {
        &self.config
    }
}

/// Open the configured vector index backend
pub async fn connect_index(config: &PdfQaConfig) -> Result<Arc<dyn VectorIndex>> {
    let dimensions = config.embeddings.dimensions;
    let index: Arc<dyn VectorIndex> = match config.index.backend {
        IndexBackend::Memory => match &config.index.snapshot_path {
            Some(path) => Arc::new(MemoryIndex::open(dimensions, path).await?),
            None => Arc::new(MemoryIndex::new(dimensions)),
        },
        IndexBackend::Pinecone => Arc::new(PineconeIndex::new(&config.index.pinecone)?),
    };

    tracing::info!("Vector index ready: {}", index.name());
    Ok(index)
}
