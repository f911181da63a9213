//! Text segmentation strategies.
//!
//! This module provides the [`TextSegmenter`] trait and two implementations:
//!
//! - [`FixedSizeSegmenter`]: hard character windows with a fixed overlap
//! - [`BoundaryAwareSegmenter`]: the same walk, with each window pulled back
//!   to the last paragraph, sentence or word break
//!
//! Both strategies share one walk: a chunk covers `[start, end)`, and the next
//! chunk starts at `end - chunk_overlap`. Consecutive chunks therefore share
//! exactly `chunk_overlap` characters, and dropping that prefix from every
//! chunk after the first reconstructs the input text. All lengths and offsets
//! count `char`s, so a window never splits a code point.

use std::sync::Arc;

use crate::config::{RagConfig, SegmentationStrategy};
use crate::document::Chunk;
use crate::error::{RagError, Result};

/// A strategy for splitting document text into overlapping chunks.
pub trait TextSegmenter: Send + Sync {
    /// Split `text` into chunks in document order.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidArgument`] if `text` is empty and
    /// [`RagError::Configuration`] if the size/overlap relation is invalid.
    fn split(&self, text: &str) -> Result<Vec<Chunk>>;

    /// Maximum number of characters per chunk.
    fn chunk_size(&self) -> usize;

    /// Number of characters shared by consecutive chunks.
    fn chunk_overlap(&self) -> usize;
}

/// Split `text` with a [`FixedSizeSegmenter`].
///
/// # Example
///
/// ```rust
/// let chunks = docqa_rag::segmenter::split("AAAA BBBB CCCC DDDD", 8, 2).unwrap();
/// let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
/// assert_eq!(texts, ["AAAA BBB", "BBB CCCC", "CC DDDD"]);
/// ```
pub fn split(text: &str, chunk_size: usize, chunk_overlap: usize) -> Result<Vec<Chunk>> {
    FixedSizeSegmenter::new(chunk_size, chunk_overlap).split(text)
}

/// Build the segmenter selected by `config.segmentation`.
pub fn segmenter_for(config: &RagConfig) -> Arc<dyn TextSegmenter> {
    match config.segmentation {
        SegmentationStrategy::Fixed => {
            Arc::new(FixedSizeSegmenter::new(config.chunk_size, config.chunk_overlap))
        }
        SegmentationStrategy::BoundaryAware => {
            Arc::new(BoundaryAwareSegmenter::new(config.chunk_size, config.chunk_overlap))
        }
    }
}

/// Splits text into windows of exactly `chunk_size` characters.
///
/// Every chunk except the last is exactly `chunk_size` characters long; the
/// walk stops as soon as a window reaches the end of the text.
#[derive(Debug, Clone)]
pub struct FixedSizeSegmenter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeSegmenter {
    /// Create a new `FixedSizeSegmenter`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl TextSegmenter for FixedSizeSegmenter {
    fn split(&self, text: &str) -> Result<Vec<Chunk>> {
        walk(text, self.chunk_size, self.chunk_overlap, |_, _, window_end| window_end)
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

/// Splits text at natural boundaries where one is available.
///
/// Each window that does not reach the end of the text is shortened to end
/// right after the last separator it contains, trying in order: paragraph
/// break (`\n\n`), line break, sentence end (`. `, `! `, `? `), then a space.
/// The separator stays with the preceding chunk. A break is only used if the
/// shortened chunk keeps at least half of the window and extends past the
/// overlap region; otherwise the window is cut at `chunk_size` characters.
///
/// Chunks are therefore at most `chunk_size` characters, and the overlap and
/// reconstruction guarantees of [`FixedSizeSegmenter`] still hold.
#[derive(Debug, Clone)]
pub struct BoundaryAwareSegmenter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl BoundaryAwareSegmenter {
    const SEPARATORS: [&'static str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

    /// Create a new `BoundaryAwareSegmenter`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of overlapping characters between consecutive chunks
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }

    fn boundary_end(&self, chars: &[char], start: usize, window_end: usize) -> usize {
        if window_end == chars.len() {
            return window_end;
        }

        let min_end = (start + self.chunk_overlap + 1).max(start + self.chunk_size / 2);
        for separator in Self::SEPARATORS {
            let sep: Vec<char> = separator.chars().collect();
            let found = (min_end..=window_end)
                .rev()
                .find(|&end| end >= sep.len() && chars[end - sep.len()..end] == sep[..]);
            if let Some(end) = found {
                return end;
            }
        }
        window_end
    }
}

impl TextSegmenter for BoundaryAwareSegmenter {
    fn split(&self, text: &str) -> Result<Vec<Chunk>> {
        walk(text, self.chunk_size, self.chunk_overlap, |chars, start, window_end| {
            self.boundary_end(chars, start, window_end)
        })
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

fn validate(text: &str, chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::Configuration("chunk_size must be greater than zero".into()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::Configuration(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    if text.is_empty() {
        return Err(RagError::InvalidArgument("text to segment must not be empty".into()));
    }
    Ok(())
}

/// Walk `text` window by window.
///
/// `choose_end(chars, start, window_end)` picks where the current chunk ends;
/// it must return a value in `(start + chunk_overlap, window_end]` unless
/// `window_end` is the end of the text.
fn walk<F>(text: &str, chunk_size: usize, chunk_overlap: usize, choose_end: F) -> Result<Vec<Chunk>>
where
    F: Fn(&[char], usize, usize) -> usize,
{
    validate(text, chunk_size, chunk_overlap)?;

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let window_end = (start + chunk_size).min(chars.len());
        let end = choose_end(&chars, start, window_end);
        debug_assert!(end == chars.len() || end > start + chunk_overlap);

        chunks.push(Chunk {
            index: chunks.len(),
            text: chars[start..end].iter().collect(),
            start,
            end,
        });

        if end >= chars.len() {
            break;
        }
        start = end - chunk_overlap;
    }

    Ok(chunks)
}
