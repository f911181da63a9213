//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use docqa_rag::{EmbeddingProvider, GenerationClient, GenerationRequest, RagError, Result};

/// Embeds text as its 26 lowercase letter counts.
///
/// Texts sharing letters score high under cosine similarity, which is enough
/// to make rankings predictable in tests.
#[derive(Debug, Default)]
pub struct LetterEmbedder {
    pub calls: AtomicUsize,
}

impl LetterEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; 26];
        for c in text.chars().flat_map(char::to_lowercase) {
            if c.is_ascii_lowercase() {
                v[(c as u8 - b'a') as usize] += 1.0;
            }
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for LetterEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    fn dimensions(&self) -> usize {
        26
    }

    fn name(&self) -> &str {
        "letters"
    }
}

/// Returns a fixed vector per text; unknown texts are an error.
#[derive(Debug, Default)]
pub struct MapEmbedder {
    pub vectors: HashMap<String, Vec<f32>>,
    pub dimensions: usize,
}

impl MapEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { vectors: HashMap::new(), dimensions }
    }

    pub fn with(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), vector);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for MapEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.vectors.get(text).cloned().ok_or_else(|| RagError::EmbeddingService {
            provider: "map".into(),
            message: format!("no vector for {text:?}"),
        })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "map"
    }
}

/// Records the size of every `embed_batch` call, optionally dropping the
/// last vector of each batch.
#[derive(Debug, Default)]
pub struct BatchRecorder {
    pub sizes: Mutex<Vec<usize>>,
    pub drop_last: bool,
}

impl BatchRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dropping_last() -> Self {
        Self { drop_last: true, ..Self::default() }
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.sizes.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for BatchRecorder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(LetterEmbedder::vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.sizes.lock().unwrap().push(texts.len());
        let mut vectors: Vec<Vec<f32>> = texts.iter().map(|t| LetterEmbedder::vector(t)).collect();
        if self.drop_last {
            vectors.pop();
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        26
    }

    fn name(&self) -> &str {
        "batch"
    }
}

/// Fails when asked to embed one specific text; otherwise behaves like
/// [`LetterEmbedder`].
#[derive(Debug)]
pub struct FailingEmbedder {
    pub poison: String,
    pub calls: AtomicUsize,
}

impl FailingEmbedder {
    pub fn new(poison: impl Into<String>) -> Self {
        Self { poison: poison.into(), calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text == self.poison {
            return Err(RagError::EmbeddingService {
                provider: "failing".into(),
                message: "service unavailable".into(),
            });
        }
        Ok(LetterEmbedder::vector(text))
    }

    fn dimensions(&self) -> usize {
        26
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Sleeps before answering, tracking the peak number of concurrent calls.
#[derive(Debug)]
pub struct SlowEmbedder {
    pub delay: Duration,
    pub in_flight: AtomicUsize,
    pub peak: AtomicUsize,
}

impl SlowEmbedder {
    pub fn new(delay: Duration) -> Self {
        Self { delay, in_flight: AtomicUsize::new(0), peak: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for SlowEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(LetterEmbedder::vector(text))
    }

    fn dimensions(&self) -> usize {
        26
    }
}

/// Records every request and answers with a canned reply.
#[derive(Debug)]
pub struct RecordingGenerator {
    pub reply: String,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl RecordingGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self { reply: reply.into(), requests: Mutex::new(Vec::new()) }
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl GenerationClient for RecordingGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Always fails.
#[derive(Debug, Default)]
pub struct FailingGenerator;

#[async_trait]
impl GenerationClient for FailingGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        Err(RagError::GenerationService {
            provider: "failing".into(),
            message: "quota exceeded".into(),
        })
    }
}

/// Never answers within any reasonable timeout.
#[derive(Debug, Default)]
pub struct HangingGenerator;

#[async_trait]
impl GenerationClient for HangingGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(String::new())
    }
}
