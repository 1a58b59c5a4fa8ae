//! Question answering over the vector index

mod qa;

pub use qa::{QaPipeline, QaSettings};
