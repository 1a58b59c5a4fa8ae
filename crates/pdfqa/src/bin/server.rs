//! pdfqa HTTP server
//!
//! Run with: cargo run -p pdfqa --bin pdfqa-server
//! Configuration is read from the TOML file named by `PDFQA_CONFIG`, if set.

use pdfqa::{server::PdfQaServer, ChatService, PdfQaConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdfqa=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var_os("PDFQA_CONFIG").map(PathBuf::from);
    let config = PdfQaConfig::load(config_path.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Documents: {}", config.documents.dir.display());
    tracing::info!("  - Embeddings: {:?} ({} dims)", config.embeddings.provider, config.embeddings.dimensions);
    tracing::info!("  - LLM: {:?}", config.llm.provider);
    tracing::info!("  - Index: {:?}", config.index.backend);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let service = ChatService::from_config(config).await?;

    let health = service.health().await;
    if health.all_healthy() {
        tracing::info!("All providers reachable");
    } else {
        tracing::warn!(
            "Provider check: embeddings={}, llm={}, index={}",
            health.embeddings,
            health.llm,
            health.index
        );
    }

    let server = PdfQaServer::new(service);

    println!("\nServer starting...");
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /chat/load-pdf                 - Load a PDF from the documents directory");
    println!("  GET  /chat/ask-question?question=   - Ask a question");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
