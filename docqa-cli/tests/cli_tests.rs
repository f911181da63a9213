use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use clap::Parser;
use docqa_cli::chat_loop;
use docqa_cli::cli::{Cli, Command, ConfigOverrides, Segmentation};
use docqa_cli::output::{preview, render_answer, render_json};
use docqa_cli::settings;
use docqa_rag::{
    Answer, Chunk, Document, EmbeddingProvider, GenerationClient, GenerationRequest, RagConfig,
    RagError, RagPipeline, ScoredChunk, SegmentationStrategy, SimilarityMetric,
};
use tempfile::TempDir;

fn answer() -> Answer {
    Answer {
        text: "An inlier is a typical observation.\n".into(),
        sources: vec![ScoredChunk {
            chunk: Chunk {
                index: 4,
                text: "Inliers   lie\nwithin the\n\nexpected range.".into(),
                start: 2400,
                end: 2441,
            },
            score: 0.8731,
        }],
    }
}

#[test]
fn parses_ask_with_overrides() {
    let cli = Cli::try_parse_from([
        "docqa",
        "--chunk-size",
        "500",
        "ask",
        "report.pdf",
        "What is an inlier?",
        "-k",
        "3",
        "--temperature",
        "0.2",
        "--segmentation",
        "boundary-aware",
        "--json",
        "--batch-size",
        "4",
    ])
    .unwrap();

    assert_eq!(cli.overrides.chunk_size, Some(500));
    assert_eq!(cli.overrides.temperature, Some(0.2));
    assert_eq!(cli.overrides.batch_size, Some(4));
    assert_eq!(cli.overrides.segmentation, Some(Segmentation::BoundaryAware));
    assert_eq!(cli.command.top_k(), Some(3));
    assert_eq!(cli.command.document(), Path::new("report.pdf"));
    match cli.command {
        Command::Ask { question, json, .. } => {
            assert_eq!(question, "What is an inlier?");
            assert!(json);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parses_chat() {
    let cli = Cli::try_parse_from(["docqa", "-v", "chat", "handbook.docx", "--show-sources"]).unwrap();

    assert!(cli.verbose);
    assert!(matches!(cli.command, Command::Chat { show_sources: true, top_k: None, .. }));
}

#[test]
fn ask_requires_a_question() {
    assert!(Cli::try_parse_from(["docqa", "ask", "report.pdf"]).is_err());
}

#[test]
fn defaults_without_file_or_flags() {
    let config = settings::resolve(None, &ConfigOverrides::default(), None).unwrap();
    assert_eq!(config, RagConfig::default());
}

#[test]
fn flags_override_file_which_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("docqa.toml");
    std::fs::write(
        &path,
        "chunk_size = 400\nchunk_overlap = 40\ntop_k = 8\nsimilarity = \"inverse_euclidean\"\n",
    )
    .unwrap();

    let overrides = ConfigOverrides {
        chunk_overlap: Some(10),
        batch_size: Some(4),
        ..ConfigOverrides::default()
    };
    let config = settings::resolve(Some(&path), &overrides, Some(2)).unwrap();

    assert_eq!(config.chunk_size, 400);
    assert_eq!(config.chunk_overlap, 10);
    assert_eq!(config.embedding_batch_size, 4);
    assert_eq!(config.top_k, 2);
    assert_eq!(config.similarity, SimilarityMetric::InverseEuclidean);
    assert_eq!(config.segmentation, SegmentationStrategy::Fixed);
    assert_eq!(config.generation_model, "gemini-pro");
}

#[test]
fn invalid_combination_is_rejected() {
    let overrides = ConfigOverrides {
        chunk_size: Some(100),
        chunk_overlap: Some(100),
        ..ConfigOverrides::default()
    };
    let err = settings::resolve(None, &overrides, None).unwrap_err();
    assert!(format!("{err:#}").contains("chunk_overlap"));
}

#[test]
fn unreadable_or_malformed_config_is_reported() {
    let dir = TempDir::new().unwrap();
    assert!(settings::load_file(&dir.path().join("missing.toml")).is_err());

    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "chunk_size = \"large\"").unwrap();
    let err = settings::load_file(&path).unwrap_err();
    assert!(err.to_string().contains("invalid config file"));
}

#[test]
fn renders_answer_with_sources() {
    let rendered = render_answer(&answer(), true);
    assert_eq!(
        rendered,
        "An inlier is a typical observation.\n\nSources:\n  [1] chunk 4 (chars 2400..2441, score 0.873): Inliers lie within the expected range.\n"
    );
    assert_eq!(render_answer(&answer(), false), "An inlier is a typical observation.\n");
}

#[test]
fn long_previews_are_truncated() {
    let text = "word ".repeat(100);
    let short = preview(&text);
    assert_eq!(short.chars().count(), 123);
    assert!(short.ends_with("..."));
}

#[test]
fn json_output_includes_question_and_sources() {
    let json = render_json("What is an inlier?", &answer()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["question"], "What is an inlier?");
    assert_eq!(value["sources"][0]["chunk"]["index"], 4);
    assert!(value["text"].as_str().unwrap().starts_with("An inlier"));
}

/// Embeds text by its length, which is enough for a one-chunk index.
struct LengthEmbedder;

#[async_trait]
impl EmbeddingProvider for LengthEmbedder {
    async fn embed(&self, text: &str) -> docqa_rag::Result<Vec<f32>> {
        Ok(vec![text.len() as f32 + 1.0, 1.0])
    }

    fn dimensions(&self) -> usize {
        2
    }
}

/// Echoes the question, failing on one that mentions "boom".
#[derive(Default)]
struct EchoGenerator {
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl GenerationClient for EchoGenerator {
    async fn generate(&self, request: &GenerationRequest) -> docqa_rag::Result<String> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        if request.prompt.contains("boom") {
            return Err(RagError::GenerationService {
                provider: "echo".into(),
                message: "quota exceeded".into(),
            });
        }
        Ok("echoed".into())
    }
}

async fn ready_pipeline(generator: Arc<EchoGenerator>) -> RagPipeline {
    let pipeline = RagPipeline::builder()
        .config(RagConfig::default())
        .embedding_provider(Arc::new(LengthEmbedder))
        .generation_client(generator)
        .build()
        .unwrap();
    pipeline.ingest(&Document::new(["Inliers lie within the expected range."])).await.unwrap();
    pipeline
}

fn scripted(lines: &[&str]) -> impl FnMut() -> anyhow::Result<Option<String>> {
    let mut lines: VecDeque<String> = lines.iter().map(|l| l.to_string()).collect();
    move || Ok(lines.pop_front())
}

#[tokio::test]
async fn chat_answers_until_exit_and_skips_blank_lines() {
    let generator = Arc::new(EchoGenerator::default());
    let pipeline = ready_pipeline(Arc::clone(&generator)).await;
    let mut out = Vec::new();

    chat_loop(&pipeline, false, scripted(&["", "what lies?", "  ", "exit", "never asked"]), &mut out)
        .await
        .unwrap();

    let out = String::from_utf8(out).unwrap();
    assert_eq!(out.matches("echoed").count(), 1);
    assert!(!out.contains("Sources"));
    assert_eq!(generator.prompts.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn chat_reports_errors_and_keeps_going_until_input_ends() {
    let generator = Arc::new(EchoGenerator::default());
    let pipeline = ready_pipeline(Arc::clone(&generator)).await;
    let mut out = Vec::new();

    chat_loop(&pipeline, true, scripted(&["boom?", "what lies?"]), &mut out).await.unwrap();

    let out = String::from_utf8(out).unwrap();
    assert!(out.starts_with("Error: "), "{out}");
    assert!(out.contains("quota exceeded"));
    assert!(out.contains("echoed"));
    assert_eq!(generator.prompts.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn chat_stops_on_read_failure() {
    let pipeline = ready_pipeline(Arc::new(EchoGenerator::default())).await;
    let mut out = Vec::new();

    let err = chat_loop(&pipeline, false, || Err(anyhow::anyhow!("terminal closed")), &mut out)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "terminal closed");
    assert!(out.is_empty());
}
