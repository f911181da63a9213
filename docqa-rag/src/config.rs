//! Configuration for the RAG pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Which [`TextSegmenter`](crate::segmenter::TextSegmenter) the pipeline uses.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SegmentationStrategy {
    /// Hard character windows of exactly `chunk_size`.
    #[default]
    Fixed,
    /// Windows shortened to the last paragraph, sentence or word break.
    BoundaryAware,
}

/// Similarity metric used by an [`EmbeddingIndex`](crate::index::EmbeddingIndex).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Cosine similarity in `[-1, 1]`.
    #[default]
    Cosine,
    /// `1 / (1 + d)` where `d` is the Euclidean distance, in `(0, 1]`.
    InverseEuclidean,
}

/// Configuration parameters for the RAG pipeline.
///
/// Defaults: 700-character chunks with 100 characters of overlap, five
/// retrieved chunks, temperature 1.0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
    /// Sampling temperature passed to the generation model.
    pub temperature: f32,
    /// Embedding model identifier, shared by chunk and query embedding.
    pub embedding_model: String,
    /// Generation model identifier.
    pub generation_model: String,
    /// Timeout applied to every embedding and generation call.
    pub request_timeout_secs: u64,
    /// Maximum number of in-flight embedding calls during ingestion.
    pub embedding_concurrency: usize,
    /// Number of chunks per embedding request during ingestion.
    pub embedding_batch_size: usize,
    /// How document text is split into chunks.
    pub segmentation: SegmentationStrategy,
    /// How chunk embeddings are compared with query embeddings.
    pub similarity: SimilarityMetric,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 700,
            chunk_overlap: 100,
            top_k: 5,
            temperature: 1.0,
            embedding_model: "models/embedding-001".to_string(),
            generation_model: "gemini-pro".to_string(),
            request_timeout_secs: 60,
            embedding_concurrency: 4,
            embedding_batch_size: 16,
            segmentation: SegmentationStrategy::Fixed,
            similarity: SimilarityMetric::Cosine,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// The per-call timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `temperature` is not finite or outside `0.0..=2.0`
    /// - `embedding_concurrency`, `embedding_batch_size` or
    ///   `request_timeout_secs` is zero
    /// - either model identifier is blank
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Configuration("chunk_size must be greater than zero".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Configuration(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::Configuration("top_k must be greater than zero".into()));
        }
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(RagError::Configuration(format!(
                "temperature ({}) must be between 0.0 and 2.0",
                self.temperature
            )));
        }
        if self.embedding_concurrency == 0 {
            return Err(RagError::Configuration(
                "embedding_concurrency must be greater than zero".into(),
            ));
        }
        if self.embedding_batch_size == 0 {
            return Err(RagError::Configuration(
                "embedding_batch_size must be greater than zero".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(RagError::Configuration(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.embedding_model.trim().is_empty() {
            return Err(RagError::Configuration("embedding_model must not be empty".into()));
        }
        if self.generation_model.trim().is_empty() {
            return Err(RagError::Configuration("generation_model must not be empty".into()));
        }
        Ok(())
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks retrieved per question.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the generation temperature.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = temperature;
        self
    }

    /// Set the embedding model identifier.
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        self.config.embedding_model = model.into();
        self
    }

    /// Set the generation model identifier.
    pub fn generation_model(mut self, model: impl Into<String>) -> Self {
        self.config.generation_model = model.into();
        self
    }

    /// Set the per-call timeout in seconds.
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    /// Set the maximum number of concurrent embedding calls during ingestion.
    pub fn embedding_concurrency(mut self, concurrency: usize) -> Self {
        self.config.embedding_concurrency = concurrency;
        self
    }

    /// Set the number of chunks per embedding request.
    pub fn embedding_batch_size(mut self, size: usize) -> Self {
        self.config.embedding_batch_size = size;
        self
    }

    /// Set the segmentation strategy.
    pub fn segmentation(mut self, strategy: SegmentationStrategy) -> Self {
        self.config.segmentation = strategy;
        self
    }

    /// Set the similarity metric.
    pub fn similarity(mut self, metric: SimilarityMetric) -> Self {
        self.config.similarity = metric;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// See [`RagConfig::validate`].
    pub fn build(self) -> Result<RagConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
