//! Document ingestion: PDF parsing, chunking, and the load-embed-upsert pipeline

mod chunker;
mod parser;
mod processor;

pub use chunker::{split_text, TextChunker, TextSegment};
pub use parser::{cleanup_pdf_text, PdfLoader};
pub use processor::{IngestPipeline, IngestSettings};
