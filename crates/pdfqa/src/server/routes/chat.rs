//! Question and ingestion endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{Answer, FileNameRequest, IngestResult, QuestionRequest};

/// GET /chat/ask-question?question=... - Answer a question from loaded PDFs
pub async fn ask_question(
    State(state): State<AppState>,
    query: std::result::Result<Query<QuestionRequest>, QueryRejection>,
) -> Result<Json<Answer>> {
    let Query(request) = query?;
    request.validate()?;

    tracing::info!("Question: \"{}\"", request.question);

    let answer = state.service().answer(&request.question).await?;
    Ok(Json(answer))
}

/// POST /chat/load-pdf - Load a PDF from the documents directory into the index
pub async fn load_pdf(
    State(state): State<AppState>,
    body: std::result::Result<Json<FileNameRequest>, JsonRejection>,
) -> Result<Json<IngestResult>> {
    let Json(request) = body?;
    request.validate()?;

    let result = state.service().ingest(&request.file_name).await?;
    Ok(Json(result))
}
