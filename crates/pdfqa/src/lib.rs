//! pdfqa: question answering over private PDF documents
//!
//! PDFs are split into overlapping chunks, embedded, and stored in a vector
//! index. Questions are embedded the same way; the nearest chunks ground a
//! language-model answer, and the best match is returned as its source.
//!
//! Embedding, vector index, and language-model backends sit behind traits in
//! [`providers`]; [`service::ChatService`] wires them together.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod service;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::PdfQaConfig;
pub use error::{Error, Result};
pub use service::ChatService;
pub use types::{Answer, Chunk, ChunkSource, Document, IngestResult, Page};
