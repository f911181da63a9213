//! Gemini embedding and generation over the Generative Language REST API.
//!
//! This module is only available when the `gemini` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::{GenerationClient, GenerationRequest};

/// The default Generative Language API endpoint.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The default embedding model.
const DEFAULT_EMBEDDING_MODEL: &str = "models/embedding-001";

/// Dimensionality of `models/embedding-001`.
const DEFAULT_DIMENSIONS: usize = 768;

const PROVIDER: &str = "Gemini";

/// Environment variables checked, in order, by the `from_env` constructors.
const API_KEY_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

fn api_key_from_env() -> Option<String> {
    API_KEY_VARS.iter().find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
}

/// Prefix bare model names with `models/`.
fn model_path(model: &str) -> String {
    if model.starts_with("models/") || model.starts_with("tunedModels/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

/// An [`EmbeddingProvider`] backed by the Gemini `embedContent` API.
///
/// # Configuration
///
/// - `model` – defaults to `models/embedding-001`.
/// - `dimensions` – defaults to 768; must match what the model returns.
/// - `task_type` – optional, e.g. `RETRIEVAL_DOCUMENT`. Left unset, chunks and
///   questions are embedded identically.
/// - `api_key` – from the constructor or `GOOGLE_API_KEY` / `GEMINI_API_KEY`.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::gemini::GeminiEmbeddingProvider;
///
/// let provider = GeminiEmbeddingProvider::new("your-api-key")?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct GeminiEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
    task_type: Option<String>,
}

impl GeminiEmbeddingProvider {
    /// Create a new provider with the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::embedding(PROVIDER, "API key must not be empty"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            task_type: None,
        })
    }

    /// Create a new provider using the `GOOGLE_API_KEY` (or `GEMINI_API_KEY`)
    /// environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = api_key_from_env().ok_or_else(|| {
            RagError::embedding(PROVIDER, "GOOGLE_API_KEY environment variable not set")
        })?;
        Self::new(api_key)
    }

    /// Set the model name (e.g. `models/text-embedding-004`).
    pub fn with_model(mut self, model: impl AsRef<str>) -> Self {
        self.model = model_path(model.as_ref());
        self
    }

    /// Set the expected output dimensionality.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }

    /// Set the task type sent with every request.
    pub fn with_task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = Some(task_type.into());
        self
    }

    /// Override the API base URL (proxies, regional endpoints).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn content_request<'a>(&'a self, text: &'a str) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model: &self.model,
            content: RequestContent { role: None, parts: vec![RequestPart { text }] },
            task_type: self.task_type.as_deref(),
        }
    }

    async fn post<B, R>(&self, action: &str, body: &B) -> Result<R>
    where
        B: Serialize,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{}:{action}", self.base_url, self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                RagError::embedding(PROVIDER, format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = PROVIDER, %status, "API error");
            return Err(RagError::embedding(
                PROVIDER,
                format!("API returned {status}: {}", error_detail(body)),
            ));
        }

        response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            RagError::embedding(PROVIDER, format!("failed to parse response: {e}"))
        })
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, model = %self.model, text_len = text.len(), "embedding single text");

        let response: EmbedContentResponse =
            self.post("embedContent", &self.content_request(text)).await?;
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = PROVIDER, model = %self.model, batch_size = texts.len(), "embedding batch");

        let request = BatchEmbedContentsRequest {
            requests: texts.iter().map(|text| self.content_request(text)).collect(),
        };
        let response: BatchEmbedContentsResponse = self.post("batchEmbedContents", &request).await?;

        if response.embeddings.len() != texts.len() {
            return Err(RagError::embedding(
                PROVIDER,
                format!(
                    "API returned {} embeddings for {} inputs",
                    response.embeddings.len(),
                    texts.len()
                ),
            ));
        }
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

/// A [`GenerationClient`] backed by the Gemini `generateContent` API.
///
/// The model and temperature come from each [`GenerationRequest`], so one
/// client serves any Gemini text model.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::gemini::GeminiGenerationClient;
///
/// let client = GeminiGenerationClient::from_env()?;
/// ```
pub struct GeminiGenerationClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    max_output_tokens: Option<u32>,
}

impl GeminiGenerationClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::generation(PROVIDER, "API key must not be empty"));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
            max_output_tokens: None,
        })
    }

    /// Create a new client using the `GOOGLE_API_KEY` (or `GEMINI_API_KEY`)
    /// environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = api_key_from_env().ok_or_else(|| {
            RagError::generation(PROVIDER, "GOOGLE_API_KEY environment variable not set")
        })?;
        Self::new(api_key)
    }

    /// Cap the number of generated tokens.
    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = Some(max);
        self
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl GenerationClient for GeminiGenerationClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let model = model_path(&request.model);
        debug!(
            provider = PROVIDER,
            model = %model,
            prompt_len = request.prompt.len(),
            temperature = request.temperature,
            "generating content"
        );

        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: Some("user"),
                parts: vec![RequestPart { text: &request.prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        let url = format!("{}/{model}:generateContent", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                RagError::generation(PROVIDER, format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = PROVIDER, %status, "API error");
            return Err(RagError::generation(
                PROVIDER,
                format!("API returned {status}: {}", error_detail(body)),
            ));
        }

        let response: GenerateContentResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            RagError::generation(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        response.into_text()
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: RequestContent<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_type: Option<&'a str>,
}

#[derive(Serialize)]
struct BatchEmbedContentsRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct BatchEmbedContentsResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ResponseContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenate the text parts of the first candidate.
    fn into_text(self) -> Result<String> {
        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(RagError::generation(PROVIDER, format!("empty response: {reason}")));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
            return Err(RagError::generation(
                PROVIDER,
                format!("candidate has no text (finish reason: {reason})"),
            ));
        }
        Ok(text)
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}
