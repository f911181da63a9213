//! Generation client trait for producing answers from a prompt.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A single generation call: the assembled prompt plus sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationRequest {
    /// The full prompt, context and question included.
    pub prompt: String,
    /// Model identifier understood by the client.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
}

/// A language model that turns a prompt into text.
///
/// The pipeline treats implementations as black boxes: no retries or
/// backoff are applied on top of them, and failures are returned as
/// [`RagError::GenerationService`](crate::RagError::GenerationService).
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{GenerationClient, GenerationRequest};
///
/// let text = client
///     .generate(&GenerationRequest {
///         prompt: "Say hello".into(),
///         model: "gemini-pro".into(),
///         temperature: 0.2,
///     })
///     .await?;
/// ```
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate text for the given request.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// A short name used in logs and error messages.
    fn name(&self) -> &str {
        "generation"
    }
}
