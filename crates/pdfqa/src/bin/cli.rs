//! pdfqa command-line client
//!
//! Run with: cargo run -p pdfqa --features cli --bin pdfqa -- ask "What is the notice period?"

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use pdfqa::{config::IndexConfig, ChatService, PdfQaConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "pdfqa", version, about = "Ask questions about your PDF documents")]
struct Cli {
    /// TOML configuration file
    #[arg(long, short, env = "PDFQA_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Directory PDFs are loaded from (overrides configuration)
    #[arg(long, global = true)]
    documents_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a PDF from the documents directory into the index
    Ingest {
        /// File name, relative to the documents directory
        file_name: String,
    },
    /// Answer a question from loaded PDFs
    Ask {
        /// The question
        question: String,
    },
    /// Check that every provider is reachable
    Health,
}

fn spinner(message: String) -> anyhow::Result<ProgressBar> {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .context("invalid progress template")?,
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    Ok(bar)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "pdfqa=debug" } else { "pdfqa=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = PdfQaConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.documents_dir {
        config.documents.dir = dir;
    }
    // Each invocation is a new process, so the memory index must persist
    if config.index.snapshot_path.is_none() {
        config.index.snapshot_path = Some(IndexConfig::default_snapshot_path());
    }

    let service = ChatService::from_config(config)
        .await
        .context("failed to initialize providers")?;

    match cli.command {
        Command::Ingest { file_name } => {
            let bar = spinner(format!("Loading {}", file_name))?;
            let result = service.ingest(&file_name).await;
            bar.finish_and_clear();

            let result = result?;
            println!(
                "{} {} ({} pages, {} chunks)",
                style("✓").green().bold(),
                style(&result.file_name).bold(),
                result.page_count,
                result.chunk_count
            );
        }
        Command::Ask { question } => {
            let bar = spinner("Thinking".to_string())?;
            let answer = service.answer(&question).await;
            bar.finish_and_clear();

            let answer = answer?;
            println!("{}\n", answer.text);
            if answer.has_source() {
                println!("{}", style("Source:").dim().bold());
                println!("{}", style(&answer.source).dim());
            } else {
                println!("{}", style(&answer.source).yellow());
            }
        }
        Command::Health => {
            let report = service.health().await;
            for (name, ok) in [
                ("embeddings", report.embeddings),
                ("llm", report.llm),
                ("index", report.index),
            ] {
                let mark = if ok {
                    style("ok").green()
                } else {
                    style("unreachable").red()
                };
                println!("{:<12} {}", name, mark);
            }
            if !report.all_healthy() {
                anyhow::bail!("one or more providers are unreachable");
            }
        }
    }

    Ok(())
}
