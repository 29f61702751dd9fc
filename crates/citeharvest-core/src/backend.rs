//! Collaborator traits: PDF text backends, text acquisition and structured
//! reference extraction.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use thiserror::Error;

use crate::{AcquiredText, AcquisitionError, DocumentMetadata, Reference, StructuredServiceError};

/// Boxed future returned by the async collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text of a PDF, one entry per page, plus whatever document info the
/// backend could read.
#[derive(Debug, Clone, Default)]
pub struct PdfText {
    pub pages: Vec<String>,
    pub metadata: DocumentMetadata,
}

impl PdfText {
    /// True when no page carries any non-whitespace text.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|p| p.trim().is_empty())
    }
}

/// Trait for PDF text extraction backends.
///
/// Backends are blocking; async callers run them on a blocking thread.
pub trait PdfBackend: Send + Sync {
    /// Short backend name used in log output.
    fn name(&self) -> &str;

    /// Extract the per-page text content of a PDF file.
    fn extract_text(&self, path: &Path) -> Result<PdfText, BackendError>;
}

/// Turns a URL or local path into plain text plus light metadata.
pub trait TextAcquirer: Send + Sync {
    fn acquire<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<AcquiredText, AcquisitionError>>;
}

/// Reference extraction performed by an external layout-aware service.
///
/// Failures are returned to the caller; implementations never fall back to
/// pattern parsing on their own.
pub trait StructuredExtractor: Send + Sync {
    fn name(&self) -> &str;

    /// Extract references from a local PDF, in document order.
    fn extract<'a>(
        &'a self,
        pdf_path: &'a Path,
    ) -> BoxFuture<'a, Result<Vec<Reference>, StructuredServiceError>>;
}
