//! Provider abstractions for embeddings, LLM, vector indexes, and document loading
//!
//! The pipelines only see the traits; concrete backends are chosen from
//! configuration in [`crate::service::ChatService::from_config`].

pub mod embedding;
pub mod index_handle;
pub mod llm;
pub mod loader;
pub mod memory;
pub mod ollama;
pub mod openai;
pub mod pinecone;
pub mod retry;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use index_handle::IndexHandle;
pub use llm::LanguageModel;
pub use loader::DocumentLoader;
pub use memory::MemoryIndex;
pub use ollama::{OllamaEmbedder, OllamaLlm};
pub use openai::{OpenAiChat, OpenAiEmbedder};
pub use pinecone::PineconeIndex;
pub use vector_store::{UpsertReport, VectorIndex};
