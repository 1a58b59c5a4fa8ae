//! OpenAI-compatible providers for embeddings and chat completions

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::OpenAiConfig;
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;

use super::embedding::{check_batch, EmbeddingProvider};
use super::llm::LanguageModel;
use super::retry::backoff;

/// Shared HTTP client for an OpenAI-compatible API
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    max_retries: u32,
}

impl OpenAiClient {
    /// Build a client with the bearer token installed as a default header
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let key = config
            .api_key
            .as_ref()
            .filter(|k| !k.expose().is_empty())
            .ok_or_else(|| Error::config("missing OpenAI API key"))?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", key.expose()))
            .map_err(|_| Error::config("invalid OpenAI API key"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("Failed to build OpenAI HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request built by `build`, retrying 429s, 5xx and transport errors.
    ///
    /// Failures are reported as `Err(message)`; callers wrap them in the
    /// error kind of their stage.
    async fn send_json<T, F>(&self, label: &str, build: F) -> std::result::Result<T, String>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut attempt = 0u32;
        loop {
            match build(&self.client).send().await {
                Ok(resp) if resp.status().is_success() => {
                    return resp
                        .json::<T>()
                        .await
                        .map_err(|e| format!("failed to parse {} response: {}", label, e));
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    tracing::debug!("{} error body: {}", label, body);
                    if should_retry(status) && attempt < self.max_retries {
                        self.wait(label, attempt, &status.to_string()).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(format!("{} request failed with HTTP {}", label, status));
                }
                Err(err) => {
                    if is_retryable_error(&err) && attempt < self.max_retries {
                        self.wait(label, attempt, &err.to_string()).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(format!("{} request failed: {}", label, err));
                }
            }
        }
    }

    async fn wait(&self, label: &str, attempt: u32, reason: &str) {
        let delay = backoff(attempt);
        tracing::warn!(
            "{} failed (attempt {}/{}): {}; retrying in {:?}",
            label,
            attempt + 1,
            self.max_retries + 1,
            reason,
            delay
        );
        tokio::time::sleep(delay).await;
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

/// Embeddings from `/embeddings`
pub struct OpenAiEmbedder {
    client: Arc<OpenAiClient>,
    model: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    /// Create a new embedder
    pub fn new(config: &OpenAiConfig, dimensions: usize) -> Result<Self> {
        Ok(Self::from_client(
            Arc::new(OpenAiClient::new(config)?),
            config.embed_model.clone(),
            dimensions,
        ))
    }

    /// Create from an existing client
    pub fn from_client(client: Arc<OpenAiClient>, model: String, dimensions: usize) -> Self {
        Self {
            client,
            model,
            dimensions,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = self.client.url("/embeddings");
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let mut response: EmbeddingResponse = self
            .client
            .send_json("OpenAI embeddings", |c| c.post(&url).json(&request))
            .await
            .map_err(Error::embedding)?;

        response.data.sort_by_key(|entry| entry.index);
        let vectors: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();
        check_batch(self.name(), texts.len(), self.dimensions, &vectors)?;
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        let url = self.client.url("/models");
        match self.client.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatContent,
}

#[derive(Deserialize)]
struct ChatContent {
    #[serde(default)]
    content: Option<String>,
}

/// Answers from `/chat/completions`
pub struct OpenAiChat {
    client: Arc<OpenAiClient>,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    /// Create a new chat model
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        Ok(Self::from_client(Arc::new(OpenAiClient::new(config)?), config))
    }

    /// Create from an existing client
    pub fn from_client(client: Arc<OpenAiClient>, config: &OpenAiConfig) -> Self {
        Self {
            client,
            model: config.chat_model.clone(),
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl LanguageModel for OpenAiChat {
    async fn generate(&self, question: &str, context: &[String]) -> Result<String> {
        let url = self.client.url("/chat/completions");
        let user = PromptBuilder::build_user_message(question, context);
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: PromptBuilder::system_instructions(),
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
        };

        tracing::info!("Generating answer with model: {}", self.model);

        let response: ChatResponse = self
            .client
            .send_json("OpenAI chat", |c| c.post(&url).json(&request))
            .await
            .map_err(Error::generation)?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| Error::generation("OpenAI chat returned no choices"))
    }

    async fn health_check(&self) -> Result<bool> {
        let url = self.client.url("/models");
        match self.client.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Build an embedder and a chat model over one shared client
pub fn openai_pair(config: &OpenAiConfig, dimensions: usize) -> Result<(OpenAiEmbedder, OpenAiChat)> {
    let client = Arc::new(OpenAiClient::new(config)?);
    Ok((
        OpenAiEmbedder::from_client(Arc::clone(&client), config.embed_model.clone(), dimensions),
        OpenAiChat::from_client(client, config),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKey;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode as AxumStatus};
    use axum::response::IntoResponse;
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1", addr)
    }

    fn config(base_url: String, max_retries: u32) -> OpenAiConfig {
        OpenAiConfig {
            api_key: Some(ApiKey::new("sk-test")),
            base_url,
            timeout_secs: 5,
            max_retries,
            ..OpenAiConfig::default()
        }
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let config = OpenAiConfig::default();
        assert!(matches!(OpenAiClient::new(&config), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_embeddings_are_reordered_by_index() {
        let app = Router::new().route(
            "/v1/embeddings",
            post(|headers: AxumHeaders, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer sk-test");
                assert_eq!(body["model"], "text-embedding-ada-002");
                Json(json!({
                    "data": [
                        { "index": 1, "embedding": [2.0, 2.0] },
                        { "index": 0, "embedding": [1.0, 1.0] }
                    ]
                }))
            }),
        );
        let (embedder, _) = openai_pair(&config(spawn(app).await, 0), 2).unwrap();

        let vectors = embedder
            .embed_batch(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 1.0], vec![2.0, 2.0]]);
    }

    #[tokio::test]
    async fn test_chat_sends_system_and_user_messages() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "gpt-3.5-turbo");
                assert_eq!(body["messages"][0]["role"], "system");
                let user = body["messages"][1]["content"].as_str().unwrap_or_default();
                assert!(user.contains("Rent is due on the first"));
                Json(json!({
                    "choices": [{ "message": { "role": "assistant", "content": " On the first. " } }]
                }))
            }),
        );
        let chat = OpenAiChat::new(&config(spawn(app).await, 0)).unwrap();

        let answer = chat
            .generate(
                "When is the rent due?",
                &["Rent is due on the first of the month.".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(answer, "On the first.");
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        AxumStatus::TOO_MANY_REQUESTS.into_response()
                    } else {
                        Json(json!({ "choices": [{ "message": { "content": "ok" } }] }))
                            .into_response()
                    }
                }
            }),
        );
        let chat = OpenAiChat::new(&config(spawn(app).await, 1)).unwrap();

        assert_eq!(chat.generate("Is this retried?", &[]).await.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let app = Router::new().route(
            "/v1/embeddings",
            post(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    AxumStatus::UNAUTHORIZED
                }
            }),
        );
        let embedder = OpenAiEmbedder::new(&config(spawn(app).await, 3), 2).unwrap();

        let result = embedder.embed("hello").await;
        assert!(matches!(result, Err(Error::Embedding { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
