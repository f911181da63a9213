//! Error types for the `docqa-rag` crate.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while ingesting a document or answering a question.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid chunking, retrieval or generation parameters.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The document's file extension has no registered extractor.
    #[error("Unsupported document format '{extension}' for {path}")]
    UnsupportedFormat {
        /// The path that was passed to the extractor.
        path: String,
        /// The lowercased extension (empty when the path has none).
        extension: String,
    },

    /// The document could not be read or contained no extractable text.
    #[error("Extraction error ({path}): {message}")]
    Extraction {
        /// The document path.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// The embedding collaborator failed or returned an unusable vector.
    #[error("Embedding service error ({provider}): {message}")]
    EmbeddingService {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The generation collaborator failed.
    #[error("Generation service error ({provider}): {message}")]
    GenerationService {
        /// The generation client that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A question was asked before a document was ingested.
    #[error("Pipeline is not ready: ingest a document before asking questions")]
    NotReady,

    /// `ingest` was called on a pipeline that already holds an index.
    #[error("Pipeline already holds an index; build a new pipeline to ingest another document")]
    AlreadyIngested,

    /// A caller-supplied argument was rejected (bad `k`, empty text).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An external call did not complete within the configured timeout.
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },
}

impl RagError {
    pub(crate) fn embedding(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingService { provider: provider.into(), message: message.into() }
    }

    #[cfg(feature = "gemini")]
    pub(crate) fn generation(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::GenerationService { provider: provider.into(), message: message.into() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

/// Run `future` under `timeout`, mapping expiry to [`RagError::Timeout`].
pub(crate) async fn with_timeout<T, F>(operation: &str, timeout: Duration, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(RagError::Timeout { operation: operation.to_string(), timeout }),
    }
}
