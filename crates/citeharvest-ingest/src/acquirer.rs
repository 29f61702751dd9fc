use std::path::{Path, PathBuf};

use citeharvest_core::{
    AcquiredText, AcquisitionError, BoxFuture, DocumentMetadata, PdfText, TextAcquirer,
};
use citeharvest_parsing::text_processing::expand_ligatures;

use crate::download::{Downloader, content_type_of};
use crate::pdf::{PdfReader, format_pages};
use crate::{clean_source, has_pdf_suffix, is_pdf_content_type, is_url, web};

/// Default [`TextAcquirer`]: PDFs by URL or path, HTML pages by URL and
/// other local files as UTF-8 text.
#[derive(Clone)]
pub struct DocumentAcquirer {
    downloader: Downloader,
    reader: PdfReader,
    page_markers: bool,
}

impl DocumentAcquirer {
    pub fn new(client: reqwest::Client, download_dir: Option<PathBuf>) -> Self {
        Self {
            downloader: Downloader::new(client, download_dir),
            reader: PdfReader::default(),
            page_markers: true,
        }
    }

    pub fn with_pdf_reader(mut self, reader: PdfReader) -> Self {
        self.reader = reader;
        self
    }

    /// Prefix each PDF page with a `--- Page N ---` marker (on by default).
    pub fn with_page_markers(mut self, markers: bool) -> Self {
        self.page_markers = markers;
        self
    }

    pub async fn acquire_source(&self, source: &str) -> Result<AcquiredText, AcquisitionError> {
        let source = clean_source(source);
        if is_url(source) {
            if has_pdf_suffix(source) {
                self.remote_pdf(source).await
            } else {
                self.remote_page(source).await
            }
        } else {
            self.local_file(Path::new(source)).await
        }
    }

    async fn remote_pdf(&self, url: &str) -> Result<AcquiredText, AcquisitionError> {
        let download = self.downloader.fetch_pdf(url).await?;
        let text = self.reader.read_async(download.path().to_path_buf()).await;
        download.release();
        self.pdf_text(text?, url)
    }

    /// Fetch a URL without a `.pdf` suffix. The response may still be a PDF.
    async fn remote_page(&self, source: &str) -> Result<AcquiredText, AcquisitionError> {
        let url = web::validate_url(source)?;
        let response = self
            .downloader
            .client()
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AcquisitionError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(AcquisitionError::Status {
                url: source.to_string(),
                status: response.status().as_u16(),
            });
        }

        let content_type = content_type_of(&response);
        if is_pdf_content_type(&content_type) {
            let download = self.downloader.save(response, content_type).await?;
            let text = self.reader.read_async(download.path().to_path_buf()).await;
            download.release();
            return self.pdf_text(text?, source);
        }

        let html = response
            .text()
            .await
            .map_err(|e| AcquisitionError::Http(e.to_string()))?;
        web::page_text(url.as_str(), &html, content_type)
    }

    async fn local_file(&self, path: &Path) -> Result<AcquiredText, AcquisitionError> {
        if !path.exists() {
            return Err(AcquisitionError::NotFound(path.to_path_buf()));
        }
        let source = path.display().to_string();
        if has_pdf_suffix(&source) {
            let text = self.reader.read_async(path.to_path_buf()).await?;
            return self.pdf_text(text, &source);
        }

        let bytes = tokio::fs::read(path).await?;
        let content = expand_ligatures(&String::from_utf8_lossy(&bytes));
        if content.trim().is_empty() {
            return Err(AcquisitionError::EmptyContent(source));
        }
        Ok(AcquiredText {
            content,
            metadata: DocumentMetadata {
                content_type: Some("text/plain".into()),
                ..Default::default()
            },
            source,
        })
    }

    fn pdf_text(&self, text: PdfText, source: &str) -> Result<AcquiredText, AcquisitionError> {
        let content = expand_ligatures(&format_pages(&text.pages, self.page_markers));
        if content.trim().is_empty() {
            return Err(AcquisitionError::EmptyContent(source.to_string()));
        }
        tracing::info!(source, pages = text.pages.len(), "acquired PDF text");
        Ok(AcquiredText {
            content,
            metadata: text.metadata,
            source: source.to_string(),
        })
    }
}

impl TextAcquirer for DocumentAcquirer {
    fn acquire<'a>(
        &'a self,
        source: &'a str,
    ) -> BoxFuture<'a, Result<AcquiredText, AcquisitionError>> {
        Box::pin(self.acquire_source(source))
    }
}
