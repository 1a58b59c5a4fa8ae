//! Chat routes

pub mod chat;

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build the `/chat` routes
pub fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/ask-question", get(chat::ask_question))
        .route("/load-pdf", post(chat::load_pdf))
}
