//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use docqa_rag::{SegmentationStrategy, SimilarityMetric};

#[derive(Debug, Parser)]
#[command(name = "docqa")]
#[command(author, version, about = "Ask questions about a PDF or DOCX document")]
#[command(long_about = r#"
docqa extracts the text of one document, indexes it with Gemini embeddings,
and answers questions grounded in the most relevant passages.

Examples:
  docqa ask report.pdf "What is an inlier?"
  docqa chat handbook.docx --top-k 3
  docqa --config docqa.toml ask notes.pdf "Summarize chapter 2" --json
"#)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "DOCQA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Gemini API key (falls back to GEMINI_API_KEY)
    #[arg(long, global = true, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(flatten)]
    pub overrides: ConfigOverrides,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer a single question and exit
    Ask {
        /// Document to index (.pdf or .docx)
        document: PathBuf,

        /// The question to answer
        question: String,

        /// Number of passages to retrieve (overrides top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Print the answer and its sources as JSON
        #[arg(long)]
        json: bool,
    },

    /// Index a document once and answer questions interactively
    Chat {
        /// Document to index (.pdf or .docx)
        document: PathBuf,

        /// Number of passages to retrieve (overrides top_k)
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Print the retrieved passages after every answer
        #[arg(long)]
        show_sources: bool,
    },
}

/// Settings that override values from the config file.
#[derive(Debug, Default, Clone, Args)]
pub struct ConfigOverrides {
    /// Chunk size in characters
    #[arg(long, global = true)]
    pub chunk_size: Option<usize>,

    /// Overlap between consecutive chunks in characters
    #[arg(long, global = true)]
    pub chunk_overlap: Option<usize>,

    /// Generation temperature (0.0 to 2.0)
    #[arg(long, global = true)]
    pub temperature: Option<f32>,

    /// Embedding model
    #[arg(long, global = true)]
    pub embedding_model: Option<String>,

    /// Generation model
    #[arg(long, global = true)]
    pub generation_model: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Maximum concurrent embedding requests while indexing
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Chunks sent per embedding request while indexing
    #[arg(long, global = true)]
    pub batch_size: Option<usize>,

    /// How the document is split into chunks
    #[arg(long, global = true, value_enum)]
    pub segmentation: Option<Segmentation>,

    /// How passages are ranked against the question
    #[arg(long, global = true, value_enum)]
    pub similarity: Option<Similarity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Segmentation {
    Fixed,
    BoundaryAware,
}

impl From<Segmentation> for SegmentationStrategy {
    fn from(value: Segmentation) -> Self {
        match value {
            Segmentation::Fixed => SegmentationStrategy::Fixed,
            Segmentation::BoundaryAware => SegmentationStrategy::BoundaryAware,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Similarity {
    Cosine,
    InverseEuclidean,
}

impl From<Similarity> for SimilarityMetric {
    fn from(value: Similarity) -> Self {
        match value {
            Similarity::Cosine => SimilarityMetric::Cosine,
            Similarity::InverseEuclidean => SimilarityMetric::InverseEuclidean,
        }
    }
}

impl Command {
    pub fn document(&self) -> &PathBuf {
        match self {
            Command::Ask { document, .. } | Command::Chat { document, .. } => document,
        }
    }

    pub fn top_k(&self) -> Option<usize> {
        match self {
            Command::Ask { top_k, .. } | Command::Chat { top_k, .. } => *top_k,
        }
    }
}
