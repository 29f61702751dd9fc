use std::path::{Path, PathBuf};
use std::sync::Arc;

use citeharvest_core::{AcquisitionError, BackendError, PdfBackend, PdfText};

use crate::text_layer::PdfExtractBackend;

/// Tries a chain of PDF backends in order and keeps the first one that
/// produces non-blank text.
#[derive(Clone)]
pub struct PdfReader {
    backends: Vec<Arc<dyn PdfBackend>>,
}

impl Default for PdfReader {
    /// MuPDF first (when compiled in), then `pdf-extract`.
    fn default() -> Self {
        let mut backends: Vec<Arc<dyn PdfBackend>> = Vec::new();
        #[cfg(feature = "pdf")]
        backends.push(Arc::new(citeharvest_pdf_mupdf::MupdfBackend::default()));
        backends.push(Arc::new(PdfExtractBackend));
        Self { backends }
    }
}

impl PdfReader {
    pub fn with_backends(backends: Vec<Arc<dyn PdfBackend>>) -> Self {
        Self { backends }
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Blocking read through the backend chain.
    pub fn read(&self, path: &Path) -> Result<PdfText, BackendError> {
        let mut last_error = None;
        for backend in &self.backends {
            match backend.extract_text(path) {
                Ok(text) if !text.is_blank() => {
                    tracing::debug!(
                        backend = backend.name(),
                        path = %path.display(),
                        pages = text.pages.len(),
                        "extracted PDF text"
                    );
                    return Ok(text);
                }
                Ok(_) => {
                    tracing::warn!(backend = backend.name(), path = %path.display(), "backend returned no text");
                }
                Err(e) => {
                    tracing::warn!(backend = backend.name(), path = %path.display(), error = %e, "backend failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            BackendError::ExtractionError(format!("no text extracted from {}", path.display()))
        }))
    }

    /// Run [`PdfReader::read`] on a blocking thread.
    pub async fn read_async(&self, path: PathBuf) -> Result<PdfText, AcquisitionError> {
        let reader = self.clone();
        tokio::task::spawn_blocking(move || reader.read(&path))
            .await
            .map_err(|e| BackendError::ExtractionError(format!("extraction task failed: {e}")))?
            .map_err(AcquisitionError::from)
    }
}

/// Join page texts into one document.
///
/// With markers every page is prefixed by `--- Page N ---` and pages are
/// separated by a blank line. Without markers pages are joined by a single
/// newline so no blank line appears at a page break.
pub fn format_pages(pages: &[String], markers: bool) -> String {
    if markers {
        pages
            .iter()
            .enumerate()
            .map(|(i, page)| format!("--- Page {} ---\n{}", i + 1, page.trim_end()))
            .collect::<Vec<_>>()
            .join("\n\n")
    } else {
        pages
            .iter()
            .map(|page| page.trim_end())
            .filter(|page| !page.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
