use std::path::Path;

use mupdf::{Document, MetadataName, TextPageFlags};

use citeharvest_core::{BackendError, DocumentMetadata, PdfBackend, PdfText};

/// Layout-aware [`PdfBackend`] built on MuPDF.
///
/// Text is read block by block and line by line, which keeps multi-column
/// layouts in reading order. Blocks sitting entirely inside the top 4%
/// (running headers) or starting in the bottom 5% (footers, page numbers) of
/// a page are dropped so they do not end up glued into citations that span
/// a page break.
///
/// This crate isolates the AGPL mupdf dependency.
pub struct MupdfBackend {
    footer_exclusion_ratio: Option<f32>,
    header_exclusion_ratio: Option<f32>,
}

impl Default for MupdfBackend {
    fn default() -> Self {
        Self {
            footer_exclusion_ratio: Some(0.05),
            header_exclusion_ratio: Some(0.04),
        }
    }
}

impl MupdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the footer exclusion ratio. Pass `0.0` to disable.
    pub fn with_footer_exclusion(mut self, ratio: f32) -> Self {
        self.footer_exclusion_ratio = (ratio > 0.0).then_some(ratio);
        self
    }

    /// Set the header exclusion ratio. Pass `0.0` to disable.
    pub fn with_header_exclusion(mut self, ratio: f32) -> Self {
        self.header_exclusion_ratio = (ratio > 0.0).then_some(ratio);
        self
    }
}

fn extraction_error(e: mupdf::Error) -> BackendError {
    BackendError::ExtractionError(e.to_string())
}

/// Read one info-dictionary entry, treating errors and blanks as absent.
fn info(document: &Document, name: MetadataName) -> Option<String> {
    document
        .metadata(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl PdfBackend for MupdfBackend {
    fn name(&self) -> &str {
        "mupdf"
    }

    fn extract_text(&self, path: &Path) -> Result<PdfText, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut pages = Vec::new();
        for page_result in document.pages().map_err(extraction_error)? {
            let page = page_result.map_err(extraction_error)?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(extraction_error)?;

            let bounds = page.bounds().map_err(extraction_error)?;
            let height = bounds.y1 - bounds.y0;
            let header_limit = self.header_exclusion_ratio.map(|r| bounds.y0 + height * r);
            let footer_limit = self.footer_exclusion_ratio.map(|r| bounds.y1 - height * r);

            let mut page_text = String::new();
            for block in text_page.blocks() {
                let block_bounds = block.bounds();
                if header_limit.is_some_and(|limit| block_bounds.y1 <= limit)
                    || footer_limit.is_some_and(|limit| block_bounds.y0 >= limit)
                {
                    continue;
                }
                for line in block.lines() {
                    page_text.extend(line.chars().map(|c| c.char().unwrap_or('\u{FFFD}')));
                    page_text.push('\n');
                }
            }
            pages.push(page_text);
        }

        let metadata = DocumentMetadata {
            page_count: Some(pages.len()),
            title: info(&document, MetadataName::Title),
            author: info(&document, MetadataName::Author),
            subject: info(&document, MetadataName::Subject),
            keywords: info(&document, MetadataName::Keywords),
            content_type: Some("application/pdf".to_string()),
        };
        tracing::debug!(path = %path.display(), pages = pages.len(), "mupdf extracted text");

        Ok(PdfText { pages, metadata })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusion_ratios() {
        let backend = MupdfBackend::new().with_footer_exclusion(0.0).with_header_exclusion(0.1);
        assert_eq!(backend.footer_exclusion_ratio, None);
        assert_eq!(backend.header_exclusion_ratio, Some(0.1));
    }

    #[test]
    fn test_missing_file_is_open_error() {
        let err = MupdfBackend::new()
            .extract_text(Path::new("/definitely/not/here.pdf"))
            .unwrap_err();
        assert!(matches!(err, BackendError::OpenError(_)));
    }
}
