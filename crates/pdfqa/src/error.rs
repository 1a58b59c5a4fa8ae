//! Error types for the PDF question-answering system

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Result type alias for pdfqa operations
pub type Result<T> = std::result::Result<T, Error>;

/// Provider stage that failed while answering a question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Embedding the question
    Embedding,
    /// Nearest-neighbor search
    Retrieval,
    /// Answer generation
    Generation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Embedding => "embedding",
            Stage::Retrieval => "retrieval",
            Stage::Generation => "generation",
        };
        f.write_str(name)
    }
}

/// pdfqa errors
///
/// Messages are meant for callers: they never carry credentials or raw provider
/// payloads. Adapters log the full detail before building one of these.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad caller input (question length, missing file name)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Referenced document does not exist
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Document exists but could not be read or parsed
    #[error("Failed to load '{filename}': {message}")]
    Load { filename: String, message: String },

    /// Embedding provider failure, dimension mismatch, or partial upsert
    #[error("Embedding failed: {message} ({stored} records stored)")]
    Embedding { message: String, stored: usize },

    /// Vector index unreachable or rejected the request
    #[error("Vector index error: {0}")]
    Index(String),

    /// Language model failure
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Opaque failure surfaced by the question-answering pipeline
    #[error("Internal Server Error ({stage} failed)")]
    Service { stage: Stage },

    /// Vector index handle used before initialization
    #[error("Vector index is not initialized")]
    NotReady,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a load error
    pub fn load(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error with nothing stored
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
            stored: 0,
        }
    }

    /// Create an index error
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Stable machine-readable kind, used in HTTP bodies and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::NotFound(_) => "not_found",
            Error::Load { .. } => "load_error",
            Error::Embedding { .. } => "embedding_error",
            Error::Index(_) => "index_error",
            Error::Generation(_) => "generation_error",
            Error::Service { .. } => "service_error",
            Error::NotReady => "not_ready",
            Error::Config(_) => "config_error",
        }
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Load { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Embedding { .. } | Error::Index(_) | Error::Generation(_) => {
                StatusCode::BAD_GATEWAY
            }
            Error::Service { .. } | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::NotReady => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
