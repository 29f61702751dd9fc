//! Structured reference extraction through a GROBID-compatible service.
//!
//! The PDF is uploaded to `{base_url}/api/processReferences` and the TEI-XML
//! answer is turned into [`Reference`]s. Failures are returned, never
//! papered over with a local fallback.

use std::path::Path;

use reqwest::multipart::{Form, Part};

use citeharvest_core::{BoxFuture, Reference, StructuredExtractor, StructuredServiceError};

pub mod tei;

pub use tei::{TeiBibl, parse_bibl_structs};

/// Longest error body kept in a [`StructuredServiceError::Status`].
const MAX_ERROR_BODY: usize = 500;

/// HTTP client for the structured-extraction service.
#[derive(Debug, Clone)]
pub struct GrobidClient {
    base_url: String,
    client: reqwest::Client,
}

impl GrobidClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of the reference-processing endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/api/processReferences", self.base_url.trim_end_matches('/'))
    }

    /// Upload `pdf_path` and parse the returned bibliography.
    pub async fn process_references(
        &self,
        pdf_path: &Path,
    ) -> Result<Vec<Reference>, StructuredServiceError> {
        let bytes = tokio::fs::read(pdf_path).await?;
        let file_name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(|e| StructuredServiceError::InvalidRequest(e.to_string()))?;
        let form = Form::new().part("input", part);

        let url = self.endpoint();
        let unreachable = |e: reqwest::Error| StructuredServiceError::Unreachable {
            url: url.clone(),
            message: e.to_string(),
        };

        tracing::debug!(url = %url, path = %pdf_path.display(), "submitting PDF for structured extraction");
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(unreachable)?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if let Some((cut, _)) = body.char_indices().nth(MAX_ERROR_BODY) {
                body.truncate(cut);
            }
            return Err(StructuredServiceError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let tei = response.text().await.map_err(unreachable)?;
        let references: Vec<Reference> = parse_bibl_structs(&tei)
            .into_iter()
            .enumerate()
            .filter_map(|(i, bibl)| bibl.into_reference(i + 1))
            .collect();

        tracing::info!(url = %url, count = references.len(), "structured extraction finished");
        Ok(references)
    }
}

impl StructuredExtractor for GrobidClient {
    fn name(&self) -> &str {
        "grobid"
    }

    fn extract<'a>(
        &'a self,
        pdf_path: &'a Path,
    ) -> BoxFuture<'a, Result<Vec<Reference>, StructuredServiceError>> {
        Box::pin(self.process_references(pdf_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_ignores_trailing_slashes() {
        let client = GrobidClient::new("http://localhost:8070//", reqwest::Client::new());
        assert_eq!(client.endpoint(), "http://localhost:8070/api/processReferences");
        let client = GrobidClient::new("http://grobid:8070", reqwest::Client::new());
        assert_eq!(client.endpoint(), "http://grobid:8070/api/processReferences");
    }

    #[tokio::test]
    async fn test_missing_pdf_is_io_error() {
        let client = GrobidClient::new("http://127.0.0.1:1", reqwest::Client::new());
        let err = client
            .process_references(Path::new("/definitely/not/here.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, StructuredServiceError::Io(_)));
    }
}
