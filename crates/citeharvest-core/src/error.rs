use std::path::PathBuf;

use thiserror::Error;

use crate::BackendError;

/// Failure fetching or reading source content.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("HTTP {status} fetching {url}")]
    Status { url: String, status: u16 },
    #[error("URL does not point to a PDF (content type: {content_type})")]
    NotPdf { content_type: String },
    #[error("request failed: {0}")]
    Http(String),
    #[error("PDF extraction failed: {0}")]
    Backend(#[from] BackendError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no text could be extracted from {0}")]
    EmptyContent(String),
}

/// Failure talking to the structured-extraction service.
#[derive(Error, Debug)]
pub enum StructuredServiceError {
    #[error("service unreachable at {url}: {message}")]
    Unreachable { url: String, message: String },
    #[error("service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not build request: {0}")]
    InvalidRequest(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Any failure the orchestrator turns into a result-level error message.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
    #[error("structured extraction failed: {0}")]
    Structured(#[from] StructuredServiceError),
}
