//! Core types for the question-answering system

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, ChunkSource, Document, Page, ScoredRecord, VectorRecord};
pub use query::{FileNameRequest, QuestionLimits, QuestionRequest};
pub use response::{Answer, IngestResult, IngestStatus, NO_SOURCE_FOUND};
