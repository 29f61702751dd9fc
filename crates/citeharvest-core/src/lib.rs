use std::fmt;
use std::path::PathBuf;

use serde::{Serialize, Serializer};

pub mod backend;
pub mod config_file;
pub mod error;

pub use backend::{
    BackendError, BoxFuture, PdfBackend, PdfText, StructuredExtractor, TextAcquirer,
};
pub use error::{AcquisitionError, ExtractionError, StructuredServiceError};

/// Marker used as the result `source` when the caller supplied the text directly.
pub const SOURCE_TEXT_CONTENT: &str = "text_content";

/// Loopback address of a locally running structured-extraction service.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8070";

/// Browser-like user agent; several publishers refuse non-browser clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const DEFAULT_FALLBACK_LINES: usize = 500;
pub const DEFAULT_MAX_CONTENT_CHARS: usize = 50_000;

/// One parsed citation.
///
/// `text` is never empty. Every other field is `None` when unknown, never an
/// empty string, so "not found" and "found but empty" cannot be confused.
/// Fields are only readable from outside; a `Reference` is built once via
/// [`Reference::new`] and the `with_*` setters and then left alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    ref_num: Option<String>,
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    doi: Option<String>,
}

impl Reference {
    /// Create a reference from its citation text. Returns `None` for blank text.
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into().trim().to_string();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            ref_num: None,
            text,
            author: None,
            year: None,
            title: None,
            doi: None,
        })
    }

    pub fn with_ref_num(mut self, ref_num: Option<String>) -> Self {
        self.ref_num = non_blank(ref_num);
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = non_blank(author);
        self
    }

    pub fn with_year(mut self, year: Option<String>) -> Self {
        self.year = non_blank(year);
        self
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = non_blank(title);
        self
    }

    pub fn with_doi(mut self, doi: Option<String>) -> Self {
        self.doi = non_blank(doi);
        self
    }

    pub fn ref_num(&self) -> Option<&str> {
        self.ref_num.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn year(&self) -> Option<&str> {
        self.year.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn doi(&self) -> Option<&str> {
        self.doi.as_deref()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Outcome of one `extract_references` call.
///
/// The count is derived from the reference list, so the two can never
/// disagree. Built once through [`success`](Self::success) or
/// [`failure`](Self::failure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceExtractionResult {
    references: Vec<Reference>,
    source: String,
    error: Option<String>,
}

impl ReferenceExtractionResult {
    pub fn success(source: impl Into<String>, references: Vec<Reference>) -> Self {
        Self {
            references,
            source: source.into(),
            error: None,
        }
    }

    pub fn failure(source: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            references: Vec::new(),
            source: source.into(),
            error: Some(error.to_string()),
        }
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn into_references(self) -> Vec<Reference> {
        self.references
    }

    pub fn count(&self) -> usize {
        self.references.len()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

impl Serialize for ReferenceExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            references: &'a [Reference],
            count: usize,
            source: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<&'a str>,
        }

        Wire {
            references: &self.references,
            count: self.count(),
            source: &self.source,
            error: self.error.as_deref(),
        }
        .serialize(serializer)
    }
}

/// Light document metadata reported by a [`TextAcquirer`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Plain text acquired from a URL or local path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcquiredText {
    pub content: String,
    pub metadata: DocumentMetadata,
    /// The cleaned source string the text was acquired from.
    pub source: String,
}

/// Runtime configuration resolved from defaults, config files and the
/// environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefer the structured-extraction service for PDF inputs.
    pub use_structured_extraction: bool,
    pub service_base_url: String,
    pub user_agent: String,
    /// Directory for scoped PDF downloads. `None` uses the system temp dir.
    pub download_dir: Option<PathBuf>,
    pub max_content_chars: usize,
    /// Trailing lines used when no bibliography heading is found.
    pub fallback_lines: usize,
    /// Additional bibliography heading keywords (e.g. "Literatur").
    pub extra_headings: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_structured_extraction: false,
            service_base_url: DEFAULT_SERVICE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            download_dir: None,
            max_content_chars: DEFAULT_MAX_CONTENT_CHARS,
            fallback_lines: DEFAULT_FALLBACK_LINES,
            extra_headings: Vec::new(),
        }
    }
}

impl Config {
    /// Resolve a runtime config from a (possibly partial) config file.
    pub fn from_file(file: &config_file::ConfigFile) -> Self {
        let defaults = Self::default();
        let structured = file.structured.clone().unwrap_or_default();
        let acquisition = file.acquisition.clone().unwrap_or_default();
        let parsing = file.parsing.clone().unwrap_or_default();

        Self {
            use_structured_extraction: structured
                .enabled
                .unwrap_or(defaults.use_structured_extraction),
            service_base_url: structured.base_url.unwrap_or(defaults.service_base_url),
            user_agent: acquisition.user_agent.unwrap_or(defaults.user_agent),
            download_dir: acquisition.download_dir.map(PathBuf::from),
            max_content_chars: acquisition
                .max_content_chars
                .unwrap_or(defaults.max_content_chars),
            fallback_lines: parsing.fallback_lines.unwrap_or(defaults.fallback_lines),
            extra_headings: parsing.extra_headings.unwrap_or_default(),
        }
    }
}
