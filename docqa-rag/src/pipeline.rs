//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the ingest-once, ask-many workflow by
//! composing a [`TextSegmenter`], an [`EmbeddingProvider`], a
//! [`GenerationClient`] and an [`ExtractorRegistry`].
//!
//! A pipeline starts [`Uninitialized`](PipelineState::Uninitialized). A
//! successful [`ingest`](RagPipeline::ingest) builds its [`EmbeddingIndex`]
//! and moves it to [`Ready`](PipelineState::Ready); there is no way back.
//! Answering a different document means building a new pipeline.
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .generation_client(Arc::new(generator))
//!     .build()?;
//!
//! pipeline.ingest_path("notes/statistics.pdf").await?;
//! let answer = pipeline.ask("What is an inlier?").await?;
//! println!("{}", answer.text);
//! ```

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::{error, info};

use crate::config::RagConfig;
use crate::document::{Answer, Document};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result, with_timeout};
use crate::extract::ExtractorRegistry;
use crate::generation::{GenerationClient, GenerationRequest};
use crate::index::{BuildOptions, EmbeddingIndex};
use crate::prompt::PromptTemplate;
use crate::segmenter::{TextSegmenter, segmenter_for};

/// Lifecycle state of a [`RagPipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No index has been built yet.
    Uninitialized,
    /// An index is built and questions can be answered.
    Ready,
}

/// Segment a document and embed its chunks into a new [`EmbeddingIndex`].
///
/// Segments are joined with a paragraph break before splitting.
///
/// # Errors
///
/// - [`RagError::InvalidArgument`] if the document has no text.
/// - [`RagError::Configuration`] if the segmenter's size/overlap are invalid.
/// - Any error from [`EmbeddingIndex::build`].
pub async fn build_index(
    document: &Document,
    segmenter: &dyn TextSegmenter,
    embedder: &dyn EmbeddingProvider,
    options: BuildOptions,
) -> Result<EmbeddingIndex> {
    let text = document.text();
    if text.is_empty() {
        return Err(RagError::InvalidArgument("document contains no text".into()));
    }

    let chunks = segmenter.split(&text)?;
    info!(
        chars = text.chars().count(),
        chunk_count = chunks.len(),
        chunk_size = segmenter.chunk_size(),
        chunk_overlap = segmenter.chunk_overlap(),
        "segmented document"
    );

    EmbeddingIndex::build(chunks, embedder, options).await
}

/// Retrieve context for `question` from `index` and generate an answer.
///
/// The top `k` chunks are placed into `prompt` in ranked order, and the
/// rendered prompt is sent to `generator` with the model, temperature and
/// timeout from `config`.
///
/// # Errors
///
/// - [`RagError::InvalidArgument`] for `k == 0` or a blank question.
/// - [`RagError::EmbeddingService`] / [`RagError::GenerationService`] when a
///   collaborator fails.
/// - [`RagError::Timeout`] when a collaborator exceeds the timeout.
pub async fn answer_with(
    question: &str,
    index: &EmbeddingIndex,
    k: usize,
    embedder: &dyn EmbeddingProvider,
    generator: &dyn GenerationClient,
    prompt: &PromptTemplate,
    config: &RagConfig,
) -> Result<Answer> {
    let sources = index.query(question, embedder, k).await?;

    let request = GenerationRequest {
        prompt: prompt.render(question, &sources),
        model: config.generation_model.clone(),
        temperature: config.temperature,
    };
    let text =
        with_timeout("generation", config.request_timeout(), generator.generate(&request)).await?;

    Ok(Answer { text, sources })
}

/// The RAG pipeline orchestrator.
///
/// Construct one via [`RagPipeline::builder()`]. The built index is
/// read-only, so an `Arc<RagPipeline>` can answer questions from several
/// tasks at once.
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    generation_client: Arc<dyn GenerationClient>,
    segmenter: Arc<dyn TextSegmenter>,
    extractors: ExtractorRegistry,
    prompt: PromptTemplate,
    index: OnceCell<Arc<EmbeddingIndex>>,
    ingest_lock: Mutex<()>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return the current lifecycle state.
    pub fn state(&self) -> PipelineState {
        if self.index.initialized() { PipelineState::Ready } else { PipelineState::Uninitialized }
    }

    /// Return the built index, if any.
    pub fn index(&self) -> Option<&Arc<EmbeddingIndex>> {
        self.index.get()
    }

    /// Ingest a document: segment → embed → index.
    ///
    /// On success the pipeline becomes [`Ready`](PipelineState::Ready). On
    /// failure it stays [`Uninitialized`](PipelineState::Uninitialized) and
    /// no partial index is kept.
    ///
    /// # Errors
    ///
    /// - [`RagError::AlreadyIngested`] if the pipeline is already Ready.
    /// - Any error from [`build_index`].
    pub async fn ingest(&self, document: &Document) -> Result<Arc<EmbeddingIndex>> {
        let _guard = self.ingest_lock.lock().await;
        if self.index.initialized() {
            return Err(RagError::AlreadyIngested);
        }

        let index = build_index(
            document,
            self.segmenter.as_ref(),
            self.embedding_provider.as_ref(),
            BuildOptions::from_config(&self.config),
        )
        .await
        .inspect_err(|e| error!(error = %e, "ingestion failed"))?;

        let index = Arc::new(index);
        self.index.set(Arc::clone(&index)).map_err(|_| RagError::AlreadyIngested)?;

        info!(
            source = ?document.source,
            chunk_count = index.len(),
            dimensions = index.dimensions(),
            "ingested document"
        );
        Ok(index)
    }

    /// Extract the file at `path` and [`ingest`](Self::ingest) it.
    ///
    /// # Errors
    ///
    /// - [`RagError::UnsupportedFormat`] for extensions without an extractor.
    /// - [`RagError::Extraction`] for unreadable or malformed files.
    /// - Any error from [`ingest`](Self::ingest).
    pub async fn ingest_path(&self, path: impl AsRef<Path>) -> Result<Arc<EmbeddingIndex>> {
        if self.index.initialized() {
            return Err(RagError::AlreadyIngested);
        }

        let path = path.as_ref().to_path_buf();
        let extractor = self.extractors.extractor_for(&path).inspect_err(|e| {
            error!(path = %path.display(), error = %e, "no extractor for document")
        })?;

        let shown = path.display().to_string();
        let document = tokio::task::spawn_blocking(move || extractor.extract(&path))
            .await
            .map_err(|e| RagError::Extraction {
                path: shown.clone(),
                message: format!("extraction task failed: {e}"),
            })?
            .inspect_err(|e| error!(path = %shown, error = %e, "extraction failed"))?;

        self.ingest(&document).await
    }

    /// Answer `question` using the `k` most similar chunks as context.
    ///
    /// `k` larger than the number of chunks is clamped.
    ///
    /// # Errors
    ///
    /// - [`RagError::NotReady`] if no document has been ingested.
    /// - Any error from [`answer_with`].
    pub async fn answer(&self, question: &str, k: usize) -> Result<Answer> {
        let Some(index) = self.index.get() else {
            error!("question asked before ingestion");
            return Err(RagError::NotReady);
        };

        let answer = answer_with(
            question,
            index,
            k,
            self.embedding_provider.as_ref(),
            self.generation_client.as_ref(),
            &self.prompt,
            &self.config,
        )
        .await
        .inspect_err(|e| error!(error = %e, "answering failed"))?;

        info!(
            source_count = answer.sources.len(),
            answer_len = answer.text.len(),
            model = %self.config.generation_model,
            "answered question"
        );
        Ok(answer)
    }

    /// Answer `question` with the configured `top_k`.
    ///
    /// # Errors
    ///
    /// See [`answer`](Self::answer).
    pub async fn ask(&self, question: &str) -> Result<Answer> {
        self.answer(question, self.config.top_k).await
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `config`, `embedding_provider` and `generation_client` are required. The
/// segmenter defaults to the strategy named in the config, the extractor
/// registry to [`ExtractorRegistry::default`], and the prompt to
/// [`PromptTemplate::default`].
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RagPipeline::builder()
///     .config(RagConfig::default())
///     .embedding_provider(Arc::new(embedder))
///     .generation_client(Arc::new(generator))
///     .segmenter(Arc::new(BoundaryAwareSegmenter::new(700, 100)))  // optional
///     .build()?;
/// ```
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    generation_client: Option<Arc<dyn GenerationClient>>,
    segmenter: Option<Arc<dyn TextSegmenter>>,
    extractors: Option<ExtractorRegistry>,
    prompt: Option<PromptTemplate>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the generation client.
    pub fn generation_client(mut self, client: Arc<dyn GenerationClient>) -> Self {
        self.generation_client = Some(client);
        self
    }

    /// Override the segmenter selected by the config.
    pub fn segmenter(mut self, segmenter: Arc<dyn TextSegmenter>) -> Self {
        self.segmenter = Some(segmenter);
        self
    }

    /// Set the extractor registry used by [`RagPipeline::ingest_path`].
    pub fn extractors(mut self, extractors: ExtractorRegistry) -> Self {
        self.extractors = Some(extractors);
        self
    }

    /// Set the prompt template.
    pub fn prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = Some(prompt);
        self
    }

    /// Build the [`RagPipeline`], validating the config and required fields.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if a required field is missing or
    /// the config is invalid.
    pub fn build(self) -> Result<RagPipeline> {
        let config = self
            .config
            .ok_or_else(|| RagError::Configuration("config is required".to_string()))?;
        config.validate()?;
        let embedding_provider = self.embedding_provider.ok_or_else(|| {
            RagError::Configuration("embedding_provider is required".to_string())
        })?;
        let generation_client = self.generation_client.ok_or_else(|| {
            RagError::Configuration("generation_client is required".to_string())
        })?;
        let segmenter = self.segmenter.unwrap_or_else(|| segmenter_for(&config));

        Ok(RagPipeline {
            config,
            embedding_provider,
            generation_client,
            segmenter,
            extractors: self.extractors.unwrap_or_default(),
            prompt: self.prompt.unwrap_or_default(),
            index: OnceCell::new(),
            ingest_lock: Mutex::new(()),
        })
    }
}
