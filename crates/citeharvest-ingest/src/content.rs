use citeharvest_core::{AcquiredText, DocumentMetadata};
use serde::Serialize;

/// Acquired text cut down to a character budget for display or hand-off.
#[derive(Debug, Clone, Serialize)]
pub struct ContentExtraction {
    pub source: String,
    pub content: String,
    pub metadata: DocumentMetadata,
    /// Character count before truncation.
    pub total_chars: usize,
    pub truncated: bool,
}

impl ContentExtraction {
    /// Keep at most `max_chars` characters of the acquired content.
    pub fn new(acquired: AcquiredText, max_chars: usize) -> Self {
        let AcquiredText {
            mut content,
            metadata,
            source,
        } = acquired;
        let total_chars = content.chars().count();
        let truncated = total_chars > max_chars;
        if truncated {
            let cut = content
                .char_indices()
                .nth(max_chars)
                .map(|(i, _)| i)
                .unwrap_or(content.len());
            content.truncate(cut);
        }
        Self {
            source,
            content,
            metadata,
            total_chars,
            truncated,
        }
    }
}
