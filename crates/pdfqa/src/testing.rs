//! Recording fakes for pipeline tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::{
    DocumentLoader, EmbeddingProvider, IndexHandle, LanguageModel, MemoryIndex, UpsertReport,
    VectorIndex,
};
use crate::types::{Page, ScoredRecord, VectorRecord};

/// Deterministic bag-of-words embedder
pub struct FakeEmbedder {
    pub dimensions: usize,
    pub calls: AtomicUsize,
    pub fail: bool,
    /// Return vectors of this size unchecked while still declaring `dimensions`
    pub wrong_dimensions: Option<usize>,
}

impl FakeEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            calls: AtomicUsize::new(0),
            fail: false,
            wrong_dimensions: None,
        }
    }

    pub fn failing(dimensions: usize) -> Self {
        Self {
            fail: true,
            ..Self::new(dimensions)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let dims = self.wrong_dimensions.unwrap_or(self.dimensions);
        let mut vector = vec![0.0; dims];
        for word in text.split_whitespace() {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if word.is_empty() {
                continue;
            }
            let bucket = word
                .bytes()
                .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
            vector[bucket % dims] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::embedding("connection reset by fake embedder"));
        }
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.fail)
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Memory index that counts upserts and queries
pub struct RecordingIndex {
    pub inner: MemoryIndex,
    pub upserts: AtomicUsize,
    pub queries: AtomicUsize,
    pub fail_queries: bool,
    /// Report only this many records stored
    pub partial: Option<usize>,
}

impl RecordingIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            inner: MemoryIndex::new(dimensions),
            upserts: AtomicUsize::new(0),
            queries: AtomicUsize::new(0),
            fail_queries: false,
            partial: None,
        }
    }

    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorIndex for RecordingIndex {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<UpsertReport> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if let Some(stored) = self.partial {
            let kept: Vec<VectorRecord> = records.into_iter().take(stored).collect();
            self.inner.upsert(kept).await?;
            return Ok(UpsertReport::partial(stored, "fake index rejected a batch"));
        }
        self.inner.upsert(records).await
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries {
            return Err(Error::index("fake index is down"));
        }
        self.inner.query(vector, top_k).await
    }

    async fn len(&self) -> Result<usize> {
        self.inner.len().await
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// LLM that echoes how much context it saw
#[derive(Default)]
pub struct FakeLlm {
    pub calls: AtomicUsize,
    pub fail: bool,
    pub last_context: Mutex<Vec<String>>,
}

impl FakeLlm {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for FakeLlm {
    async fn generate(&self, question: &str, context: &[String]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_context.lock() = context.to_vec();
        if self.fail {
            return Err(Error::generation("upstream said: invalid api key sk-secret"));
        }
        if context.is_empty() {
            Ok("I don't know.".to_string())
        } else {
            Ok(format!("Answer to '{}' from {} passages", question, context.len()))
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.fail)
    }

    fn name(&self) -> &str {
        "fake"
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}

/// Loader that returns fixed pages for any existing path
pub struct FakeLoader {
    pub pages: Vec<Page>,
    pub calls: AtomicUsize,
    pub last_path: Mutex<Option<PathBuf>>,
}

impl FakeLoader {
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            pages,
            calls: AtomicUsize::new(0),
            last_path: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentLoader for FakeLoader {
    async fn load(&self, location: &Path) -> Result<Vec<Page>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_path.lock() = Some(location.to_path_buf());
        Ok(self.pages.clone())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Text cycling one sentence to exactly `len` characters
pub fn sentence_text(len: usize) -> String {
    "The tenant may terminate this lease with notice. "
        .chars()
        .cycle()
        .take(len)
        .collect()
}

/// Handle wrapping a ready recording index
pub fn ready_handle(index: &Arc<RecordingIndex>) -> IndexHandle {
    IndexHandle::ready(Arc::clone(index) as Arc<dyn VectorIndex>)
}
