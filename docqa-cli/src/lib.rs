//! # docqa-cli
//!
//! The `docqa` command: index one PDF or DOCX document with Gemini
//! embeddings and answer questions about it, either once (`ask`) or in an
//! interactive session (`chat`).

pub mod cli;
pub mod output;
pub mod settings;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use docqa_rag::gemini::{GeminiEmbeddingProvider, GeminiGenerationClient};
use docqa_rag::{RagConfig, RagPipeline};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info};

use crate::cli::{Cli, Command};
use crate::output::{render_answer, render_json};

/// Run the parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config = settings::resolve(cli.config.as_deref(), &cli.overrides, cli.command.top_k())?;
    debug!(?config, "resolved configuration");

    let pipeline = gemini_pipeline(config, cli.api_key.as_deref())?;
    ingest(&pipeline, cli.command.document()).await?;

    match cli.command {
        Command::Ask { question, json, .. } => {
            let answer = pipeline.ask(&question).await?;
            if json {
                println!("{}", render_json(&question, &answer)?);
            } else {
                print!("{}", render_answer(&answer, true));
            }
        }
        Command::Chat { show_sources, .. } => chat(&pipeline, show_sources).await?,
    }
    Ok(())
}

/// Build a pipeline backed by Gemini embedding and generation.
///
/// Without an explicit key, `GOOGLE_API_KEY` or `GEMINI_API_KEY` is used.
pub fn gemini_pipeline(config: RagConfig, api_key: Option<&str>) -> Result<RagPipeline> {
    let (embedder, generator) = match api_key {
        Some(key) => (GeminiEmbeddingProvider::new(key)?, GeminiGenerationClient::new(key)?),
        None => (GeminiEmbeddingProvider::from_env()?, GeminiGenerationClient::from_env()?),
    };
    let embedder = embedder.with_model(&config.embedding_model);

    let pipeline = RagPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(embedder))
        .generation_client(Arc::new(generator))
        .build()?;
    Ok(pipeline)
}

async fn ingest(pipeline: &RagPipeline, document: &Path) -> Result<()> {
    let index = pipeline
        .ingest_path(document)
        .await
        .with_context(|| format!("failed to index {}", document.display()))?;
    info!(document = %document.display(), chunks = index.len(), "document ready");
    eprintln!("Indexed {} chunks from {}", index.len(), document.display());
    Ok(())
}

async fn chat(pipeline: &RagPipeline, show_sources: bool) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("Ask a question about the document. Type 'exit' or press Ctrl-D to quit.");

    // readline blocks the calling thread until the user hits enter
    let read_line = || -> Result<Option<String>> {
        match tokio::task::block_in_place(|| editor.readline("? ")) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    editor.add_history_entry(line.trim())?;
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(None),
            Err(e) => Err(e.into()),
        }
    };
    chat_loop(pipeline, show_sources, read_line, &mut std::io::stdout()).await
}

/// Answer questions from `read_line` until it returns `None` or the user
/// types `exit` or `quit`.
///
/// Blank lines are skipped. A failed question is reported to `out` and does
/// not end the session.
pub async fn chat_loop<R, W>(
    pipeline: &RagPipeline,
    show_sources: bool,
    mut read_line: R,
    out: &mut W,
) -> Result<()>
where
    R: FnMut() -> Result<Option<String>>,
    W: Write,
{
    while let Some(line) = read_line()? {
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question, "exit" | "quit") {
            break;
        }

        match pipeline.ask(question).await {
            Ok(answer) => writeln!(out, "{}", render_answer(&answer, show_sources))?,
            Err(e) => writeln!(out, "Error: {e}")?,
        }
    }
    Ok(())
}
