//! Read-only embedding index with exhaustive similarity search.
//!
//! An [`EmbeddingIndex`] is built once from a chunk sequence and never
//! mutated afterwards. There are no insert or delete operations, so a shared
//! `Arc<EmbeddingIndex>` can serve concurrent queries without locking.

use std::time::Duration;

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, error, info};

use crate::config::{RagConfig, SimilarityMetric};
use crate::document::{Chunk, ScoredChunk};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result, with_timeout};

/// A chunk paired with its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// The indexed chunk.
    pub chunk: Chunk,
    /// The chunk's embedding.
    pub embedding: Vec<f32>,
}

/// Settings used while building an [`EmbeddingIndex`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildOptions {
    /// Similarity metric used for every query against the index.
    pub metric: SimilarityMetric,
    /// Maximum number of concurrent embedding calls.
    pub concurrency: usize,
    /// Number of chunks sent in each [`EmbeddingProvider::embed_batch`] call.
    pub batch_size: usize,
    /// Timeout applied to each embedding call, at build and query time.
    pub timeout: Duration,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

impl BuildOptions {
    /// Take the metric, concurrency, batch size and timeout from a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Self {
        Self {
            metric: config.similarity,
            concurrency: config.embedding_concurrency,
            batch_size: config.embedding_batch_size,
            timeout: config.request_timeout(),
        }
    }
}

/// An immutable set of [`IndexEntry`] values searchable by embedding similarity.
///
/// Entries are stored in chunk order, and every entry has the same
/// dimensionality.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{BuildOptions, EmbeddingIndex};
///
/// let index = EmbeddingIndex::build(chunks, &embedder, BuildOptions::default()).await?;
/// let top = index.query("what is an inlier?", &embedder, 5).await?;
/// ```
#[derive(Debug)]
pub struct EmbeddingIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
    metric: SimilarityMetric,
    timeout: Duration,
}

impl EmbeddingIndex {
    /// Embed every chunk and build the index.
    ///
    /// Chunks are embedded in batches of `options.batch_size`, with at most
    /// `options.concurrency` batches in flight, and every batch must succeed
    /// before the index exists.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidArgument`] if `chunks` is empty.
    /// - [`RagError::Configuration`] if `options.concurrency` or
    ///   `options.batch_size` is zero.
    /// - [`RagError::EmbeddingService`] if any embedding call fails, returns
    ///   the wrong number of vectors, or returns vectors that are non-finite
    ///   or whose length differs from [`EmbeddingProvider::dimensions`].
    /// - [`RagError::Timeout`] if any batch exceeds `options.timeout`.
    pub async fn build(
        chunks: Vec<Chunk>,
        embedder: &dyn EmbeddingProvider,
        options: BuildOptions,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(RagError::InvalidArgument("cannot build an index from zero chunks".into()));
        }
        if options.concurrency == 0 {
            return Err(RagError::Configuration("concurrency must be greater than zero".into()));
        }
        if options.batch_size == 0 {
            return Err(RagError::Configuration("batch_size must be greater than zero".into()));
        }

        let provider = embedder.name().to_string();
        debug!(
            provider = %provider,
            chunk_count = chunks.len(),
            batch_size = options.batch_size,
            "embedding chunks"
        );

        let batches: Vec<Vec<Vec<f32>>> = stream::iter(chunks.chunks(options.batch_size))
            .map(|batch| embed_chunks(batch, embedder, options.timeout))
            .buffered(options.concurrency)
            .try_collect()
            .await
            .inspect_err(|e| error!(provider = %provider, error = %e, "index build failed"))?;
        let embeddings: Vec<Vec<f32>> = batches.into_iter().flatten().collect();

        let dimensions = check_dimensions(&provider, embedder.dimensions(), &embeddings)
            .inspect_err(|e| error!(provider = %provider, error = %e, "index build failed"))?;

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();

        info!(
            provider = %provider,
            chunk_count = entries.len(),
            dimensions,
            metric = ?options.metric,
            "built embedding index"
        );

        Ok(Self { entries, dimensions, metric: options.metric, timeout: options.timeout })
    }

    /// Embed `text` with `embedder` and return the `k` most similar chunks.
    ///
    /// `embedder` must be the provider the index was built with, so that the
    /// query lands in the same vector space. `k` larger than the number of
    /// entries is clamped to it.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidArgument`] if `k == 0` or `text` is blank.
    /// - [`RagError::EmbeddingService`] if embedding fails or the query
    ///   vector's dimensionality differs from the index's.
    /// - [`RagError::Timeout`] if the embedding call times out.
    pub async fn query(
        &self,
        text: &str,
        embedder: &dyn EmbeddingProvider,
        k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        if text.trim().is_empty() {
            return Err(RagError::InvalidArgument("query text must not be empty".into()));
        }
        validate_k(k)?;

        let embedding = with_timeout("embedding query", self.timeout, embedder.embed(text)).await?;
        if embedding.len() != self.dimensions {
            return Err(RagError::embedding(
                embedder.name(),
                format!(
                    "query embedding has {} dimensions, index has {}",
                    embedding.len(),
                    self.dimensions
                ),
            ));
        }
        if embedding.iter().any(|v| !v.is_finite()) {
            return Err(RagError::embedding(
                embedder.name(),
                "query embedding contains non-finite values",
            ));
        }

        self.query_by_vector(&embedding, k)
    }

    /// Return the `k` entries most similar to `embedding`.
    ///
    /// Results are ordered by descending score; equal scores keep chunk
    /// order, so the earlier chunk wins a tie.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `k == 0` or `embedding` has
    /// the wrong dimensionality.
    pub fn query_by_vector(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        validate_k(k)?;
        if embedding.len() != self.dimensions {
            return Err(RagError::InvalidArgument(format!(
                "embedding has {} dimensions, index has {}",
                embedding.len(),
                self.dimensions
            )));
        }

        let mut ranked: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, self.metric.score(&entry.embedding, embedding)))
            .collect();

        // stable sort: ties stay in chunk order
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k.min(self.entries.len()));

        Ok(ranked
            .into_iter()
            .map(|(i, score)| ScoredChunk { chunk: self.entries[i].chunk.clone(), score })
            .collect())
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false` for a successfully built index.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimensionality shared by every stored embedding.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The metric every query uses.
    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    /// The stored entries, in chunk order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// The indexed chunks, in chunk order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|entry| &entry.chunk)
    }
}

impl SimilarityMetric {
    /// Score two vectors of equal length; higher means more similar.
    pub fn score(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            SimilarityMetric::Cosine => cosine_similarity(a, b),
            SimilarityMetric::InverseEuclidean => 1.0 / (1.0 + euclidean_distance(a, b)),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum::<f32>().sqrt()
}

fn validate_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(RagError::InvalidArgument("k must be greater than zero".into()));
    }
    Ok(())
}

/// Embed one batch of consecutive chunks under `timeout`.
async fn embed_chunks(
    batch: &[Chunk],
    embedder: &dyn EmbeddingProvider,
    timeout: Duration,
) -> Result<Vec<Vec<f32>>> {
    let span = chunk_span(batch);
    let texts: Vec<&str> = batch.iter().map(|chunk| chunk.text.as_str()).collect();

    let vectors = with_timeout(&format!("embedding {span}"), timeout, embedder.embed_batch(&texts))
        .await
        .map_err(|e| match e {
            RagError::EmbeddingService { provider, message } => {
                RagError::EmbeddingService { provider, message: format!("{span}: {message}") }
            }
            other => other,
        })?;

    if vectors.len() != batch.len() {
        return Err(RagError::embedding(
            embedder.name(),
            format!("{span}: got {} embeddings for {} chunks", vectors.len(), batch.len()),
        ));
    }
    Ok(vectors)
}

/// `chunk 3` or `chunks 0-15`.
fn chunk_span(batch: &[Chunk]) -> String {
    match (batch.first(), batch.last()) {
        (Some(first), Some(last)) if first.index != last.index => {
            format!("chunks {}-{}", first.index, last.index)
        }
        (Some(first), _) => format!("chunk {}", first.index),
        _ => "no chunks".to_string(),
    }
}

/// Check that all vectors are finite and have the provider's declared length.
fn check_dimensions(provider: &str, declared: usize, embeddings: &[Vec<f32>]) -> Result<usize> {
    if declared == 0 {
        return Err(RagError::embedding(provider, "provider declares zero dimensions"));
    }
    for (i, embedding) in embeddings.iter().enumerate() {
        if embedding.len() != declared {
            return Err(RagError::embedding(
                provider,
                format!(
                    "chunk {i}: embedding has {} dimensions, provider declares {declared}",
                    embedding.len()
                ),
            ));
        }
        if embedding.iter().any(|v| !v.is_finite()) {
            return Err(RagError::embedding(
                provider,
                format!("chunk {i}: embedding contains non-finite values"),
            ));
        }
    }
    Ok(declared)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn inverse_euclidean_is_one_for_identical_vectors() {
        let v = [0.3, -0.4, 1.2];
        assert_eq!(SimilarityMetric::InverseEuclidean.score(&v, &v), 1.0);
    }

    #[test]
    fn check_dimensions_rejects_mixed_lengths() {
        let err = check_dimensions("mock", 2, &[vec![1.0, 0.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, RagError::EmbeddingService { .. }));
    }

    #[test]
    fn chunk_span_names_single_and_ranges() {
        let chunk = |index| Chunk { index, text: String::new(), start: 0, end: 0 };
        assert_eq!(chunk_span(&[chunk(3)]), "chunk 3");
        assert_eq!(chunk_span(&[chunk(0), chunk(1), chunk(2)]), "chunks 0-2");
    }
}
