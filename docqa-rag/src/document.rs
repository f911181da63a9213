//! Data types for documents, chunks, and answers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Separator placed between document segments when they are concatenated.
pub const SEGMENT_SEPARATOR: &str = "\n\n";

/// A source document: an ordered sequence of extracted text segments.
///
/// Segments are pages for PDFs and paragraphs for DOCX files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The extracted segments, in document order.
    pub segments: Vec<String>,
    /// The file the segments were extracted from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

impl Document {
    /// Create a document from in-memory segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { segments: segments.into_iter().map(Into::into).collect(), source: None }
    }

    /// Record the file this document was extracted from.
    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Concatenate the non-blank segments with [`SEGMENT_SEPARATOR`].
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(SEGMENT_SEPARATOR)
    }
}

/// A contiguous window of a document's text.
///
/// `start` and `end` are character (not byte) offsets into the concatenated
/// document text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Position of the chunk in document order.
    pub index: usize,
    /// The chunk text.
    pub text: String,
    /// Character offset where the chunk starts.
    pub start: usize,
    /// Character offset one past the chunk's last character.
    pub end: usize,
}

impl Chunk {
    /// Number of characters in the chunk.
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// A retrieved [`Chunk`] paired with its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// A generated answer with the chunks that were used as its context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Answer {
    /// The generated text.
    pub text: String,
    /// The retrieved chunks, ranked by descending similarity.
    pub sources: Vec<ScoredChunk>,
}
