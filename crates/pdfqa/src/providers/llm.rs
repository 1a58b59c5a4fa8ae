//! Language model trait for generating answers

use async_trait::async_trait;

use crate::error::Result;

/// Trait for LLM-based answer generation
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server (`/api/generate`)
/// - `OpenAiChat`: OpenAI-compatible chat completions
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Answer `question` using the retrieved `context` passages (may be empty)
    async fn generate(&self, question: &str, context: &[String]) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
