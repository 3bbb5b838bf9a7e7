//! PDF acquisition and text extraction.
//!
//! A source string is either an `http(s)://` URL or a local path. Bytes are loaded into memory
//! by a [`SourceLoader`] and parsed on the blocking pool; nothing is written to disk. Failures
//! are reported inside [`ExtractedDocument`] rather than as errors so callers can surface the
//! message verbatim.

mod loader;
mod pdf;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use loader::{PdfSourceLoader, SourceLoader};

/// Reasons a source could not be turned into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Local path does not exist.
    #[error("File not found: {0}")]
    NotFound(String),
    /// Local file exists but could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// Remote fetch failed before a response arrived.
    #[error("Failed to download PDF: {0}")]
    Download(String),
    /// Remote server answered with a non-success status.
    #[error("Failed to download PDF from {url}: HTTP {status}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },
    /// Bytes are not a readable PDF.
    #[error("Failed to parse PDF: {0}")]
    Parse(String),
    /// PDF parsed but has no pages.
    #[error("PDF has no pages.")]
    NoPages,
}

/// Result of extracting text from a PDF source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedDocument {
    /// Extracted text, trimmed. Empty on failure.
    pub text: String,
    /// Page count. Zero on failure.
    pub pages: usize,
    /// Whether extraction succeeded.
    pub success: bool,
    /// Failure reason, or a notice when the PDF holds no text.
    pub error: Option<String>,
}

impl ExtractedDocument {
    /// Failed extraction carrying `message`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            pages: 0,
            success: false,
            error: Some(message.into()),
        }
    }

    fn from_parsed(text: String, pages: usize) -> Self {
        let error = text
            .is_empty()
            .then(|| "PDF contains no extractable text.".to_string());
        Self {
            text,
            pages,
            success: true,
            error,
        }
    }
}

/// Capability consumed by the pipeline: turn a source string into text.
#[async_trait]
pub trait PdfExtractor: Send + Sync {
    /// Extract text from `source`. Never fails; problems are reported in the result.
    async fn extract(&self, source: &str) -> ExtractedDocument;
}

/// Default extractor: loads bytes through a [`SourceLoader`] and parses them in memory.
pub struct PdfTextExtractor {
    loader: Arc<dyn SourceLoader>,
}

impl PdfTextExtractor {
    /// Extractor over the given loader.
    pub fn new(loader: Arc<dyn SourceLoader>) -> Self {
        Self { loader }
    }

    /// Extractor using [`PdfSourceLoader`] with the given download timeout.
    pub fn with_fetch_timeout(timeout: Duration) -> Result<Self, ExtractionError> {
        Ok(Self::new(Arc::new(PdfSourceLoader::new(timeout)?)))
    }

    async fn try_extract(&self, source: &str) -> Result<ExtractedDocument, ExtractionError> {
        let bytes = self.loader.load(source).await?;
        let parsed = tokio::task::spawn_blocking(move || pdf::parse_pdf(&bytes))
            .await
            .map_err(|error| ExtractionError::Parse(format!("parser task failed: {error}")))??;
        Ok(ExtractedDocument::from_parsed(parsed.text, parsed.pages))
    }
}

#[async_trait]
impl PdfExtractor for PdfTextExtractor {
    async fn extract(&self, source: &str) -> ExtractedDocument {
        match self.try_extract(source).await {
            Ok(document) => {
                tracing::info!(
                    source,
                    pages = document.pages,
                    chars = document.text.len(),
                    "Extracted PDF text"
                );
                document
            }
            Err(error) => {
                tracing::error!(source, %error, "PDF extraction failed");
                ExtractedDocument::failure(error.to_string())
            }
        }
    }
}
