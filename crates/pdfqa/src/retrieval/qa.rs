//! Retrieval-QA pipeline: embed question, search, generate, cite

use std::cmp::Ordering;
use std::sync::Arc;

use crate::config::PdfQaConfig;
use crate::error::{Error, Result, Stage};
use crate::providers::{EmbeddingProvider, IndexHandle, LanguageModel};
use crate::types::{Answer, QuestionLimits, ScoredRecord};

/// Settings for the question-answering pipeline
#[derive(Debug, Clone, Copy)]
pub struct QaSettings {
    /// Nearest neighbors retrieved per question
    pub top_k: usize,
    /// Accepted question lengths
    pub limits: QuestionLimits,
}

impl QaSettings {
    /// Settings from configuration
    pub fn from_config(config: &PdfQaConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k.max(1),
            limits: QuestionLimits::new(
                config.retrieval.min_question_chars,
                config.retrieval.max_question_chars,
            ),
        }
    }
}

impl Default for QaSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            limits: QuestionLimits::new(10, 200),
        }
    }
}

/// Answers questions from indexed chunks
pub struct QaPipeline {
    settings: QaSettings,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LanguageModel>,
    index: IndexHandle,
}

impl QaPipeline {
    /// Create a new QA pipeline
    pub fn new(
        settings: QaSettings,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LanguageModel>,
        index: IndexHandle,
    ) -> Self {
        Self {
            settings,
            embedder,
            llm,
            index,
        }
    }

    /// Answer a question, citing the best-matching chunk
    ///
    /// Provider failures come back as [`Error::Service`] naming only the
    /// failed stage; the underlying error is logged.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        self.settings.limits.check(question)?;
        let index = self.index.get()?;

        let query = self
            .embedder
            .embed(question)
            .await
            .map_err(|e| mask(Stage::Embedding, e))?;

        let mut matches = index
            .query(&query, self.settings.top_k)
            .await
            .map_err(|e| mask(Stage::Retrieval, e))?;

        rank(&mut matches);

        tracing::info!(
            "Retrieved {} chunks (best score {:.3})",
            matches.len(),
            matches.first().map(|m| m.score).unwrap_or(0.0)
        );

        let context: Vec<String> = matches.iter().map(|m| m.record.text.clone()).collect();

        let text = self
            .llm
            .generate(question, &context)
            .await
            .map_err(|e| mask(Stage::Generation, e))?;

        Ok(match matches.into_iter().next() {
            Some(best) => {
                tracing::debug!(
                    "Answer sourced from {} (chunk {})",
                    best.record.metadata.format_citation(),
                    best.record.metadata.chunk_index
                );
                Answer::new(text, best.record.text)
            }
            None => {
                tracing::warn!("No indexed chunks matched; answering without context");
                Answer::ungrounded(text)
            }
        })
    }
}

/// Highest similarity first
fn rank(matches: &mut [ScoredRecord]) {
    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

fn mask(stage: Stage, err: Error) -> Error {
    tracing::error!(stage = %stage, kind = err.kind(), "Question answering failed: {}", err);
    Error::Service { stage }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::VectorIndex;
    use crate::testing::{ready_handle, FakeEmbedder, FakeLlm, RecordingIndex};
    use crate::types::{Chunk, ChunkSource, VectorRecord, NO_SOURCE_FOUND};

    struct Fixture {
        embedder: Arc<FakeEmbedder>,
        llm: Arc<FakeLlm>,
        index: Arc<RecordingIndex>,
    }

    impl Fixture {
        fn new(embedder: FakeEmbedder, llm: FakeLlm, index: RecordingIndex) -> Self {
            Self {
                embedder: Arc::new(embedder),
                llm: Arc::new(llm),
                index: Arc::new(index),
            }
        }

        fn healthy() -> Self {
            Self::new(FakeEmbedder::new(256), FakeLlm::default(), RecordingIndex::new(256))
        }

        fn pipeline(&self) -> QaPipeline {
            QaPipeline::new(
                QaSettings::default(),
                self.embedder.clone(),
                self.llm.clone(),
                ready_handle(&self.index),
            )
        }

        async fn store(&self, texts: &[&str]) {
            let texts: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
            let vectors = self.embedder.embed_batch(&texts).await.unwrap();
            let records = texts
                .into_iter()
                .zip(vectors)
                .enumerate()
                .map(|(i, (text, vector))| {
                    let source = ChunkSource {
                        filename: "lease.pdf".to_string(),
                        page_number: 1,
                        char_offset: i * 100,
                        chunk_index: i as u32,
                    };
                    VectorRecord::from_chunk(Chunk::new(text, source), vector)
                })
                .collect();
            self.index.inner.upsert(records).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_single_match_is_returned_verbatim() {
        let fx = Fixture::healthy();
        let passage = "Either party may terminate this lease with thirty days written notice.";
        fx.store(&[passage]).await;

        let answer = fx
            .pipeline()
            .answer("How can the lease be terminated?")
            .await
            .unwrap();

        assert_eq!(answer.source, passage);
        assert!(!answer.text.is_empty());
        assert!(answer.has_source());
    }

    #[tokio::test]
    async fn test_best_match_is_the_source_and_context_is_ranked() {
        let fx = Fixture::healthy();
        fx.store(&[
            "Rent is payable monthly in advance.",
            "The lease may be terminated with thirty days notice.",
            "Pets are not allowed on the premises.",
        ])
        .await;

        let answer = fx
            .pipeline()
            .answer("How many days notice to terminate the lease?")
            .await
            .unwrap();

        assert_eq!(answer.source, "The lease may be terminated with thirty days notice.");
        let context = fx.llm.last_context.lock().clone();
        assert_eq!(context.len(), 3);
        assert_eq!(context[0], answer.source);
    }

    #[tokio::test]
    async fn test_empty_index_uses_sentinel() {
        let fx = Fixture::healthy();

        let answer = fx.pipeline().answer("What is the notice period?").await.unwrap();

        assert_eq!(answer.source, NO_SOURCE_FOUND);
        assert!(!answer.text.is_empty());
        assert!(fx.llm.last_context.lock().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_questions_make_no_provider_calls() {
        let fx = Fixture::healthy();
        let pipeline = fx.pipeline();

        for question in ["".to_string(), "   ".to_string(), "short".to_string(), "a".repeat(201)] {
            let err = pipeline.answer(&question).await.unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "{:?}", question);
        }

        assert_eq!(fx.embedder.calls(), 0);
        assert_eq!(fx.index.queries(), 0);
        assert_eq!(fx.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_answer_never_mutates_index() {
        let fx = Fixture::healthy();
        fx.store(&["Rent is payable monthly in advance."]).await;

        fx.pipeline().answer("When is the rent payable?").await.unwrap();

        assert_eq!(fx.index.upserts(), 0);
        assert_eq!(fx.index.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_provider_failures_are_masked_by_stage() {
        let fx = Fixture::new(FakeEmbedder::failing(32), FakeLlm::default(), RecordingIndex::new(32));
        let err = fx.pipeline().answer("What is the notice period?").await.unwrap_err();
        assert!(matches!(err, Error::Service { stage: Stage::Embedding }));

        let mut index = RecordingIndex::new(32);
        index.fail_queries = true;
        let fx = Fixture::new(FakeEmbedder::new(32), FakeLlm::default(), index);
        let err = fx.pipeline().answer("What is the notice period?").await.unwrap_err();
        assert!(matches!(err, Error::Service { stage: Stage::Retrieval }));

        let fx = Fixture::new(FakeEmbedder::new(32), FakeLlm::failing(), RecordingIndex::new(32));
        let err = fx.pipeline().answer("What is the notice period?").await.unwrap_err();
        assert!(matches!(err, Error::Service { stage: Stage::Generation }));
        assert!(!err.to_string().contains("sk-secret"));
    }

    #[tokio::test]
    async fn test_uninitialized_index_is_not_ready() {
        let fx = Fixture::healthy();
        let pipeline = QaPipeline::new(
            QaSettings::default(),
            fx.embedder.clone(),
            fx.llm.clone(),
            IndexHandle::new(),
        );

        assert!(matches!(
            pipeline.answer("What is the notice period?").await,
            Err(Error::NotReady)
        ));
        assert_eq!(fx.embedder.calls(), 0);
    }
}
