//! Document text extraction, dispatched by file extension.
//!
//! [`ExtractorRegistry::default`] knows `.pdf` (feature `pdf`, one segment per
//! page) and `.docx` (feature `docx`, one segment per paragraph). Further
//! formats are added with [`ExtractorRegistry::register`] without touching
//! the pipeline.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::document::Document;
use crate::error::{RagError, Result};

/// Turns a file on disk into a [`Document`].
pub trait DocumentExtractor: Send + Sync {
    /// Lowercase extensions (without the dot) this extractor handles.
    fn extensions(&self) -> &[&'static str];

    /// Extract the document's text segments.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Extraction`] if the file cannot be read, is
    /// malformed, or contains no text.
    fn extract(&self, path: &Path) -> Result<Document>;
}

/// Maps file extensions to extractors.
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn DocumentExtractor>>,
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut extensions: Vec<&str> = self.extractors.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        f.debug_struct("ExtractorRegistry").field("extensions", &extensions).finish()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::empty();
        #[cfg(feature = "pdf")]
        registry.register(Arc::new(PdfExtractor));
        #[cfg(feature = "docx")]
        registry.register(Arc::new(DocxExtractor));
        registry
    }
}

impl ExtractorRegistry {
    /// A registry with no extractors.
    pub fn empty() -> Self {
        Self { extractors: HashMap::new() }
    }

    /// Register `extractor` for each of its extensions, replacing any
    /// previous extractor for them.
    pub fn register(&mut self, extractor: Arc<dyn DocumentExtractor>) {
        for extension in extractor.extensions() {
            self.extractors.insert(extension.to_string(), Arc::clone(&extractor));
        }
    }

    /// Whether an extractor is registered for `extension` (case-insensitive).
    pub fn supports(&self, extension: &str) -> bool {
        self.extractors.contains_key(&extension.to_lowercase())
    }

    /// Find the extractor for `path` by its extension.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UnsupportedFormat`] if the extension is missing or
    /// unknown.
    pub fn extractor_for(&self, path: &Path) -> Result<Arc<dyn DocumentExtractor>> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        self.extractors.get(&extension).cloned().ok_or_else(|| RagError::UnsupportedFormat {
            path: path.display().to_string(),
            extension,
        })
    }

    /// Extract `path` with the extractor registered for its extension.
    ///
    /// # Errors
    ///
    /// See [`extractor_for`](Self::extractor_for) and
    /// [`DocumentExtractor::extract`].
    pub fn extract(&self, path: &Path) -> Result<Document> {
        let document = self.extractor_for(path)?.extract(path)?;
        debug!(path = %path.display(), segments = document.segments.len(), "extracted document");
        Ok(document)
    }
}

fn extraction_error(path: &Path, message: impl Into<String>) -> RagError {
    RagError::Extraction { path: path.display().to_string(), message: message.into() }
}

fn ensure_text(path: &Path, document: Document) -> Result<Document> {
    if document.segments.iter().all(|s| s.trim().is_empty()) {
        return Err(extraction_error(path, "no text content could be extracted"));
    }
    Ok(document)
}

/// Extracts one segment per PDF page using `lopdf`.
#[cfg(feature = "pdf")]
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

#[cfg(feature = "pdf")]
impl DocumentExtractor for PdfExtractor {
    fn extensions(&self) -> &[&'static str] {
        &["pdf"]
    }

    fn extract(&self, path: &Path) -> Result<Document> {
        let pdf = lopdf::Document::load(path)
            .map_err(|e| extraction_error(path, format!("failed to load PDF: {e}")))?;
        if pdf.is_encrypted() {
            return Err(extraction_error(path, "encrypted PDFs are not supported"));
        }

        let mut segments = Vec::new();
        for page_number in pdf.get_pages().keys() {
            let text = pdf.extract_text(&[*page_number]).map_err(|e| {
                extraction_error(path, format!("failed to extract page {page_number}: {e}"))
            })?;
            segments.push(normalize_pdf_text(&text));
        }

        ensure_text(path, Document { segments, source: Some(path.to_path_buf()) })
    }
}

/// Trim lines, drop NULs and blank lines.
#[cfg(feature = "pdf")]
fn normalize_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extracts one segment per body paragraph using `docx-rs`.
///
/// Tables are skipped.
#[cfg(feature = "docx")]
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxExtractor;

#[cfg(feature = "docx")]
impl DocumentExtractor for DocxExtractor {
    fn extensions(&self) -> &[&'static str] {
        &["docx"]
    }

    fn extract(&self, path: &Path) -> Result<Document> {
        let bytes = std::fs::read(path)
            .map_err(|e| extraction_error(path, format!("failed to read file: {e}")))?;
        let docx = docx_rs::read_docx(&bytes)
            .map_err(|e| extraction_error(path, format!("failed to parse DOCX: {e}")))?;

        let mut segments = Vec::new();
        for child in docx.document.children {
            if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
                let mut text = String::new();
                for child in &paragraph.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in &run.children {
                            match child {
                                docx_rs::RunChild::Text(t) => text.push_str(&t.text),
                                docx_rs::RunChild::Tab(_) => text.push('\t'),
                                _ => {}
                            }
                        }
                    }
                }
                segments.push(text);
            }
        }

        ensure_text(path, Document { segments, source: Some(path.to_path_buf()) })
    }
}

#[cfg(all(test, feature = "pdf"))]
mod tests {
    use super::*;

    #[test]
    fn normalize_pdf_text_drops_blank_lines() {
        assert_eq!(normalize_pdf_text("  a \n\n\0\n b\n"), "a\nb");
    }
}
