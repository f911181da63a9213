//! The embedding capability used for both chunks and questions.

use async_trait::async_trait;

use crate::error::Result;

/// Turns text into fixed-length vectors.
///
/// An [`EmbeddingIndex`](crate::index::EmbeddingIndex) calls
/// [`embed_batch`](Self::embed_batch) for document chunks at build time and
/// [`embed`](Self::embed) for each question, so one provider must serve both
/// to keep them in the same vector space. Every vector it returns must have
/// exactly [`dimensions`](Self::dimensions) components; the index rejects
/// anything else.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, returning one vector per input in input order.
    ///
    /// Falls back to one [`embed`](Self::embed) call per text, stopping at
    /// the first failure. Backends with a batch endpoint should override it.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Length of every vector this provider returns.
    fn dimensions(&self) -> usize;

    /// Provider name used in logs and errors.
    fn name(&self) -> &str {
        "embedding"
    }
}
