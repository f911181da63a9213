//! # docqa-rag
//!
//! Retrieval-Augmented Generation over a single PDF or DOCX document.
//!
//! A [`RagPipeline`] extracts a document's text, splits it into overlapping
//! chunks, embeds every chunk into a read-only [`EmbeddingIndex`], and then
//! answers questions by retrieving the most similar chunks and handing them,
//! together with the question, to a [`GenerationClient`]. Each [`Answer`]
//! carries the chunks it was generated from.
//!
//! Embedding and generation are capabilities injected as trait objects, so
//! any backend (or a test double) can be plugged in. Gemini implementations
//! are available behind the `gemini` feature.
//!
//! ## Features
//!
//! | feature  | default | enables                                  |
//! |----------|---------|------------------------------------------|
//! | `pdf`    | yes     | [`extract::PdfExtractor`] (`lopdf`)      |
//! | `docx`   | yes     | [`extract::DocxExtractor`] (`docx-rs`)   |
//! | `gemini` | no      | [`gemini`] embedding and generation      |
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docqa_rag::gemini::{GeminiEmbeddingProvider, GeminiGenerationClient};
//! use docqa_rag::{RagConfig, RagPipeline};
//!
//! let config = RagConfig::default();
//! let pipeline = RagPipeline::builder()
//!     .embedding_provider(Arc::new(
//!         GeminiEmbeddingProvider::from_env()?.with_model(&config.embedding_model),
//!     ))
//!     .generation_client(Arc::new(GeminiGenerationClient::from_env()?))
//!     .config(config)
//!     .build()?;
//!
//! pipeline.ingest_path("report.pdf").await?;
//! let answer = pipeline.ask("What is an inlier?").await?;
//! ```

pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generation;
pub mod index;
pub mod pipeline;
pub mod prompt;
pub mod segmenter;

#[cfg(feature = "gemini")]
pub mod gemini;

pub use config::{RagConfig, RagConfigBuilder, SegmentationStrategy, SimilarityMetric};
pub use document::{Answer, Chunk, Document, ScoredChunk};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use extract::{DocumentExtractor, ExtractorRegistry};
pub use generation::{GenerationClient, GenerationRequest};
pub use index::{BuildOptions, EmbeddingIndex, IndexEntry};
pub use pipeline::{PipelineState, RagPipeline, RagPipelineBuilder, answer_with, build_index};
pub use prompt::PromptTemplate;
pub use segmenter::{BoundaryAwareSegmenter, FixedSizeSegmenter, TextSegmenter};
