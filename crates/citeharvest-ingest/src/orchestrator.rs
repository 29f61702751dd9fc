//! Reference extraction pipeline: chooses between supplied text, structured
//! extraction of a PDF and pattern parsing of acquired text.

use std::path::Path;
use std::sync::Arc;

use citeharvest_core::{
    AcquisitionError, Config, ExtractionError, Reference, ReferenceExtractionResult,
    SOURCE_TEXT_CONTENT, StructuredExtractor, TextAcquirer,
};
use citeharvest_grobid::GrobidClient;
use citeharvest_parsing::{ParsingConfigBuilder, PatternReferenceParser};

use crate::acquirer::DocumentAcquirer;
use crate::download::Downloader;
use crate::{clean_source, has_pdf_suffix, is_url};

pub struct ReferenceExtractionOrchestrator {
    parser: PatternReferenceParser,
    acquirer: Arc<dyn TextAcquirer>,
    structured: Option<Arc<dyn StructuredExtractor>>,
    downloader: Downloader,
}

impl ReferenceExtractionOrchestrator {
    pub fn new(
        parser: PatternReferenceParser,
        acquirer: Arc<dyn TextAcquirer>,
        structured: Option<Arc<dyn StructuredExtractor>>,
        downloader: Downloader,
    ) -> Self {
        Self {
            parser,
            acquirer,
            structured,
            downloader,
        }
    }

    /// Build the default pipeline described by `config`.
    ///
    /// Fails only when configured section headings do not form a valid
    /// pattern.
    pub fn from_config(config: &Config, client: reqwest::Client) -> Result<Self, regex::Error> {
        let parser =
            PatternReferenceParser::with_config(ParsingConfigBuilder::from_config(config).build()?);
        // A blank line ends the located bibliography, so pages are joined
        // without one.
        let acquirer = DocumentAcquirer::new(client.clone(), config.download_dir.clone())
            .with_page_markers(false);
        let structured = config.use_structured_extraction.then(|| {
            Arc::new(GrobidClient::new(config.service_base_url.clone(), client.clone()))
                as Arc<dyn StructuredExtractor>
        });
        Ok(Self::new(
            parser,
            Arc::new(acquirer),
            structured,
            Downloader::new(client, config.download_dir.clone()),
        ))
    }

    pub fn with_structured_extractor(mut self, extractor: Option<Arc<dyn StructuredExtractor>>) -> Self {
        self.structured = extractor;
        self
    }

    pub fn with_acquirer(mut self, acquirer: Arc<dyn TextAcquirer>) -> Self {
        self.acquirer = acquirer;
        self
    }

    pub fn structured_enabled(&self) -> bool {
        self.structured.is_some()
    }

    pub fn parser(&self) -> &PatternReferenceParser {
        &self.parser
    }

    /// Extract the references of a document.
    ///
    /// Non-blank `content_text` is parsed directly and reported with the
    /// `text_content` source. Otherwise `input_source` names a PDF (URL or
    /// path) or is itself the document text. Failures are reported in the
    /// result, never raised.
    pub async fn extract_references(
        &self,
        input_source: &str,
        content_text: Option<&str>,
    ) -> ReferenceExtractionResult {
        if let Some(text) = content_text.filter(|t| !t.trim().is_empty()) {
            let references = self.parser.parse_document(text);
            tracing::info!(source = SOURCE_TEXT_CONTENT, count = references.len(), "extracted references");
            return ReferenceExtractionResult::success(SOURCE_TEXT_CONTENT, references);
        }

        let source = clean_source(input_source);
        if !has_pdf_suffix(source) {
            let references = self.parser.parse_document(input_source);
            tracing::info!(count = references.len(), "extracted references from inline text");
            return ReferenceExtractionResult::success(input_source, references);
        }

        match self.extract_pdf(source).await {
            Ok(references) => {
                tracing::info!(source, count = references.len(), "extracted references");
                ReferenceExtractionResult::success(source, references)
            }
            Err(e) => {
                tracing::error!(source, error = %e, "reference extraction failed");
                ReferenceExtractionResult::failure(source, e)
            }
        }
    }

    async fn extract_pdf(&self, source: &str) -> Result<Vec<Reference>, ExtractionError> {
        let Some(structured) = &self.structured else {
            let acquired = self.acquirer.acquire(source).await?;
            return Ok(self.parser.parse_document(&acquired.content));
        };

        tracing::debug!(source, service = structured.name(), "using structured extraction");
        if is_url(source) {
            let download = self.downloader.fetch_pdf(source).await?;
            let outcome = structured.extract(download.path()).await;
            download.release();
            Ok(outcome?)
        } else {
            let path = Path::new(source);
            if !path.exists() {
                return Err(AcquisitionError::NotFound(path.to_path_buf()).into());
            }
            Ok(structured.extract(path).await?)
        }
    }
}
