//! Pinecone vector index over the REST data plane

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use crate::config::PineconeConfig;
use crate::error::{Error, Result};
use crate::types::{ChunkSource, ScoredRecord, VectorRecord};

use super::vector_store::{UpsertReport, VectorIndex};

/// Metadata key holding the chunk text
const TEXT_KEY: &str = "text";

/// Pinecone index client
pub struct PineconeIndex {
    client: Client,
    base_url: String,
    namespace: Option<String>,
    batch_size: usize,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<PineconeVector<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Serialize)]
struct PineconeVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: HashMap<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertResponse {
    #[serde(default)]
    upserted_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    values: Vec<f32>,
    #[serde(default)]
    metadata: HashMap<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    #[serde(default)]
    total_vector_count: usize,
    #[serde(default)]
    namespaces: HashMap<String, NamespaceStats>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NamespaceStats {
    #[serde(default)]
    vector_count: usize,
}

impl PineconeIndex {
    /// Create a client from configuration (key and host are required)
    pub fn new(config: &PineconeConfig) -> Result<Self> {
        let key = config
            .api_key
            .as_ref()
            .ok_or_else(|| Error::config("missing Pinecone API key"))?;
        let host = config
            .index_host
            .as_deref()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| Error::config("missing Pinecone index host"))?;

        let mut headers = HeaderMap::new();
        let mut api_key = HeaderValue::from_str(key.expose())
            .map_err(|_| Error::config("invalid Pinecone API key"))?;
        api_key.set_sensitive(true);
        headers.insert("api-key", api_key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("Failed to build Pinecone HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: normalize_host(host),
            namespace: config.namespace.clone(),
            batch_size: config.upsert_batch_size.max(1),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn upsert_batch(&self, batch: &[VectorRecord]) -> Result<usize> {
        let request = UpsertRequest {
            vectors: batch
                .iter()
                .map(|record| {
                    let mut metadata = record.metadata.to_metadata();
                    metadata.insert(TEXT_KEY.to_string(), Value::String(record.text.clone()));
                    PineconeVector {
                        id: &record.id,
                        values: &record.vector,
                        metadata,
                    }
                })
                .collect(),
            namespace: self.namespace.as_deref(),
        };

        let response = self
            .client
            .post(self.url("/vectors/upsert"))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::index(format!("Pinecone upsert request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Pinecone upsert error body: {}", body);
            return Err(Error::index(format!("Pinecone upsert returned HTTP {}", status)));
        }

        let parsed: UpsertResponse = response
            .json()
            .await
            .map_err(|e| Error::index(format!("Failed to parse Pinecone upsert response: {}", e)))?;

        if parsed.upserted_count != batch.len() {
            tracing::warn!(
                "Pinecone acknowledged {} of {} vectors",
                parsed.upserted_count,
                batch.len()
            );
        }
        Ok(parsed.upserted_count.min(batch.len()))
    }
}

/// Accept a bare host or a full URL
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

/// Matches without chunk text cannot ground an answer and are dropped
fn record_from_match(m: QueryMatch) -> Option<ScoredRecord> {
    let text = match m.metadata.get(TEXT_KEY).and_then(|v| v.as_str()) {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => {
            tracing::warn!("Pinecone match {} has no chunk text, skipping", m.id);
            return None;
        }
    };

    Some(ScoredRecord {
        score: m.score,
        record: VectorRecord {
            metadata: ChunkSource::from_metadata(&m.metadata),
            id: m.id,
            vector: m.values,
            text,
        },
    })
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<UpsertReport> {
        let mut stored = 0;

        for (i, batch) in records.chunks(self.batch_size).enumerate() {
            match self.upsert_batch(batch).await {
                Ok(count) => stored += count,
                // Nothing reached the index
                Err(e) if i == 0 => return Err(e),
                Err(e) => {
                    tracing::error!("Pinecone upsert stopped after {} records: {}", stored, e);
                    return Ok(UpsertReport::partial(stored, e.to_string()));
                }
            }
        }

        tracing::debug!("Upserted {} vectors into Pinecone", stored);
        Ok(UpsertReport::complete(stored))
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let response = self
            .client
            .post(self.url("/query"))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::index(format!("Pinecone query request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Pinecone query error body: {}", body);
            return Err(Error::index(format!("Pinecone query returned HTTP {}", status)));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| Error::index(format!("Failed to parse Pinecone query response: {}", e)))?;

        Ok(parsed.matches.into_iter().filter_map(record_from_match).collect())
    }

    async fn len(&self) -> Result<usize> {
        let response = self
            .client
            .post(self.url("/describe_index_stats"))
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| Error::index(format!("Pinecone stats request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::index(format!(
                "Pinecone stats returned HTTP {}",
                response.status()
            )));
        }

        let stats: StatsResponse = response
            .json()
            .await
            .map_err(|e| Error::index(format!("Failed to parse Pinecone stats: {}", e)))?;

        Ok(match &self.namespace {
            Some(ns) => stats.namespaces.get(ns).map(|s| s.vector_count).unwrap_or(0),
            None => stats.total_vector_count,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.len().await.is_ok())
    }

    fn name(&self) -> &str {
        "pinecone"
    }
}
