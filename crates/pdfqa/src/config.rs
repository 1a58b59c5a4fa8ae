//! Configuration for the PDF question-answering system

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfQaConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Where ingestable PDFs live
    pub documents: DocumentsConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Answer generation configuration
    pub llm: LlmConfig,
    /// Ollama connection (local backend)
    pub ollama: OllamaConfig,
    /// OpenAI-compatible connection
    pub openai: OpenAiConfig,
    /// Vector index configuration
    pub index: IndexConfig,
    /// Retrieval / question validation configuration
    pub retrieval: RetrievalConfig,
}

impl PdfQaConfig {
    /// Load configuration from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (no environment overrides)
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::config(format!("Invalid TOML: {}", e)))
    }

    /// Override secrets and endpoints from the process environment
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.openai.api_key = Some(ApiKey::new(key));
        }
        if let Ok(key) = std::env::var("PINECONE_API_KEY") {
            self.index.pinecone.api_key = Some(ApiKey::new(key));
        }
        if let Ok(host) = std::env::var("PINECONE_INDEX_HOST") {
            self.index.pinecone.index_host = Some(host);
        }
        if let Ok(dir) = std::env::var("PDFQA_DOCUMENTS_DIR") {
            self.documents.dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            self.ollama.base_url = url;
        }
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::config("chunking.chunk_size must be positive"));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::config(
                "chunking.chunk_overlap must be smaller than chunking.chunk_size",
            ));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::config("embeddings.dimensions must be positive"));
        }
        if self.embeddings.batch_size == 0 || self.embeddings.concurrency == 0 {
            return Err(Error::config(
                "embeddings.batch_size and embeddings.concurrency must be positive",
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::config("retrieval.top_k must be positive"));
        }
        if self.retrieval.min_question_chars > self.retrieval.max_question_chars {
            return Err(Error::config(
                "retrieval.min_question_chars exceeds retrieval.max_question_chars",
            ));
        }

        let uses_openai = self.embeddings.provider == ProviderBackend::OpenAi
            || self.llm.provider == ProviderBackend::OpenAi;
        if uses_openai && self.openai.api_key.is_none() {
            return Err(Error::config(
                "OpenAI backend selected but no API key is configured (OPENAI_API_KEY)",
            ));
        }

        if self.index.backend == IndexBackend::Pinecone {
            let pinecone = &self.index.pinecone;
            if pinecone.api_key.is_none() || pinecone.index_host.is_none() {
                return Err(Error::config(
                    "Pinecone backend selected but PINECONE_API_KEY or PINECONE_INDEX_HOST is missing",
                ));
            }
        }

        Ok(())
    }
}

/// API credential that never shows up in logs or debug output
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into().trim().to_string())
    }

    /// Raw key for request headers
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Backend for embeddings and generation
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// OpenAI or any OpenAI-compatible endpoint
    #[serde(rename = "openai")]
    OpenAi,
}

/// Backend for the vector index
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    /// In-process cosine index, optionally snapshotted to disk
    #[default]
    Memory,
    /// Pinecone serverless / pod index over REST
    Pinecone,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_cors: true,
        }
    }
}

/// Document location configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Directory that file names are resolved against
    pub dir: PathBuf,
    /// Longest accepted file name
    pub max_file_name_chars: usize,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./pdf"),
            max_file_name_chars: 100,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks of a page
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 50,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Which backend computes embeddings
    pub provider: ProviderBackend,
    /// Declared vector dimension (768 for nomic-embed-text, 1536 for ada-002)
    pub dimensions: usize,
    /// Texts per embedding request
    pub batch_size: usize,
    /// Embedding batches in flight per ingestion
    pub concurrency: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderBackend::Ollama,
            dimensions: 768,
            batch_size: 64,
            concurrency: 5,
        }
    }
}

/// Answer generation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Which backend generates answers
    pub provider: ProviderBackend,
}

/// Ollama configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Ollama base URL
    pub base_url: String,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for failed requests (0 = fail fast)
    pub max_retries: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            embed_model: "nomic-embed-text".to_string(),
            generate_model: "llama3.2:3b".to_string(),
            temperature: 0.3,
            timeout_secs: 120,
            max_retries: 0,
        }
    }
}

/// OpenAI-compatible configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key (usually from `OPENAI_API_KEY`)
    pub api_key: Option<ApiKey>,
    /// API base URL
    pub base_url: String,
    /// Embedding model
    pub embed_model: String,
    /// Chat model
    pub chat_model: String,
    /// Sampling temperature for chat completions
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for 429 / 5xx / connection errors (0 = fail fast)
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            embed_model: "text-embedding-ada-002".to_string(),
            chat_model: "gpt-3.5-turbo".to_string(),
            temperature: 0.9,
            timeout_secs: 60,
            max_retries: 0,
        }
    }
}

/// Vector index configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Which index backend to use
    pub backend: IndexBackend,
    /// JSON snapshot for the memory backend (None = purely in-memory)
    pub snapshot_path: Option<PathBuf>,
    /// Pinecone settings
    pub pinecone: PineconeConfig,
}

impl IndexConfig {
    /// Default snapshot location under the user's data directory
    pub fn default_snapshot_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pdfqa")
            .join("index.json")
    }
}

/// Pinecone configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PineconeConfig {
    /// API key (usually from `PINECONE_API_KEY`)
    pub api_key: Option<ApiKey>,
    /// Index host, e.g. `my-index-abc123.svc.us-east1-gcp.pinecone.io`
    pub index_host: Option<String>,
    /// Namespace inside the index
    pub namespace: Option<String>,
    /// Vectors per upsert request (Pinecone caps requests at 100 vectors with metadata)
    pub upsert_batch_size: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for PineconeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            index_host: None,
            namespace: None,
            upsert_batch_size: 100,
            timeout_secs: 30,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Nearest neighbors retrieved per question
    pub top_k: usize,
    /// Shortest accepted question
    pub min_question_chars: usize,
    /// Longest accepted question
    pub max_question_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_question_chars: 10,
            max_question_chars: 200,
        }
    }
}
