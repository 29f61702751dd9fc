//! Pure-Rust PDF text backend built on `pdf-extract`.

use std::path::Path;

use citeharvest_core::{BackendError, DocumentMetadata, PdfBackend, PdfText};

/// Reads the text layer with `pdf-extract`. Slower and less faithful to
/// layout than MuPDF, but has no native dependency.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractBackend;

impl PdfBackend for PdfExtractBackend {
    fn name(&self) -> &str {
        "pdf-extract"
    }

    fn extract_text(&self, path: &Path) -> Result<PdfText, BackendError> {
        let bytes = std::fs::read(path)?;
        // The parser panics on some malformed files.
        let text = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes))
            .map_err(|_| BackendError::ExtractionError("pdf-extract panicked".into()))?
            .map_err(|e| BackendError::ExtractionError(e.to_string()))?;

        let pages = split_pages(&text);
        Ok(PdfText {
            metadata: DocumentMetadata {
                page_count: Some(pages.len()),
                content_type: Some("application/pdf".into()),
                ..Default::default()
            },
            pages,
        })
    }
}

/// Split extracted text on form feeds. Text without page breaks is one page.
fn split_pages(text: &str) -> Vec<String> {
    let mut pages: Vec<String> = text.split('\x0C').map(str::to_string).collect();
    while pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }
    pages
}
