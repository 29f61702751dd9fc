//! Download of remote PDFs into scoped temporary files.

use std::io::Write;
use std::path::{Path, PathBuf};

use citeharvest_core::AcquisitionError;
use futures_util::StreamExt;
use tempfile::NamedTempFile;

use crate::{has_pdf_suffix, is_pdf_content_type};

/// Fetches PDFs over HTTP into temporary files.
///
/// Files are created in `dir` when set, otherwise in the system temp
/// directory.
#[derive(Clone)]
pub struct Downloader {
    client: reqwest::Client,
    dir: Option<PathBuf>,
}

impl Downloader {
    pub fn new(client: reqwest::Client, dir: Option<PathBuf>) -> Self {
        Self { client, dir }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Download `url` and check that it is a PDF, either by its
    /// `Content-Type` or by the `.pdf` suffix of the URL path.
    pub async fn fetch_pdf(&self, url: &str) -> Result<ScopedDownload, AcquisitionError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AcquisitionError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AcquisitionError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let content_type = content_type_of(&response);
        if !is_pdf_content_type(&content_type) && !has_pdf_suffix(url) {
            return Err(AcquisitionError::NotPdf { content_type });
        }

        self.save(response, content_type).await
    }

    /// Stream a response body into a new temporary `.pdf` file.
    pub(crate) async fn save(
        &self,
        response: reqwest::Response,
        content_type: String,
    ) -> Result<ScopedDownload, AcquisitionError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("citeharvest-").suffix(".pdf");
        let mut file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        let mut stream = response.bytes_stream();
        let mut bytes_downloaded: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AcquisitionError::Http(e.to_string()))?;
            file.write_all(&chunk)?;
            bytes_downloaded += chunk.len() as u64;
        }
        file.flush()?;

        tracing::debug!(
            path = %file.path().display(),
            bytes = bytes_downloaded,
            "downloaded PDF"
        );

        Ok(ScopedDownload { file, content_type })
    }
}

pub(crate) fn content_type_of(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// A downloaded file that is removed when released or dropped.
#[derive(Debug)]
pub struct ScopedDownload {
    file: NamedTempFile,
    content_type: String,
}

impl ScopedDownload {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Remove the file now. A failed removal is logged and otherwise
    /// ignored.
    pub fn release(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove temporary download");
        }
    }
}
