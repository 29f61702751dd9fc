//! Source acquisition and the reference extraction pipeline.
//!
//! A source is either a URL or a local path. PDFs go through the structured
//! extraction service when one is configured, otherwise through a text
//! backend and the pattern parser. Anything else is treated as text.

use std::path::Path;

pub mod acquirer;
pub mod content;
pub mod download;
pub mod orchestrator;
pub mod pdf;
pub mod text_layer;
pub mod web;

pub use acquirer::DocumentAcquirer;
pub use content::ContentExtraction;
pub use download::{Downloader, ScopedDownload};
pub use orchestrator::ReferenceExtractionOrchestrator;
pub use pdf::PdfReader;
pub use text_layer::PdfExtractBackend;

// Re-export domain types for convenience
pub use citeharvest_core::{AcquiredText, Reference, ReferenceExtractionResult};

/// Trim a raw source string and drop a trailing code fence left behind by
/// copy-pasted input.
pub fn clean_source(source: &str) -> &str {
    let trimmed = source.trim();
    trimmed
        .strip_suffix("```")
        .map(str::trim_end)
        .unwrap_or(trimmed)
}

/// True for absolute `http`/`https` URLs.
pub fn is_url(source: &str) -> bool {
    reqwest::Url::parse(source)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// True when the source names a PDF: a URL whose path ends in `.pdf`, or a
/// local path with a `.pdf` extension. Case-insensitive.
pub fn has_pdf_suffix(source: &str) -> bool {
    if is_url(source) {
        return reqwest::Url::parse(source)
            .map(|url| url.path().to_ascii_lowercase().ends_with(".pdf"))
            .unwrap_or(false);
    }
    Path::new(source)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

/// True when a `Content-Type` header value denotes a PDF.
pub(crate) fn is_pdf_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/pdf"))
}
