//! Locating the bibliography inside full document text.
//!
//! This is a best-effort heuristic. When no heading is found the trailing
//! lines of the document are returned, and nothing guarantees that they
//! actually hold references.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{DEFAULT_HEADINGS, ParsingConfig, heading_pattern};

static HEADING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(&heading_pattern(DEFAULT_HEADINGS)).unwrap());

/// A single capitalised word on its own line ("Appendix", "ACKNOWLEDGMENTS",
/// "5 Conclusion:") or an appendix/supplement heading.
static SECTION_END_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:\d+(?:\.\d+)*\.?\s+)?(?:\p{Lu}\p{L}*\s*:?|(?i:appendix|appendices|supplementary\s+materials?)\b.*)\s*$",
    )
    .unwrap()
});

/// The part of a document believed to contain the reference list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BibliographySection<'a> {
    /// Section text, a slice of the input.
    pub text: &'a str,
    /// The heading line that introduced the section, if one was found.
    pub heading: Option<&'a str>,
}

impl BibliographySection<'_> {
    /// Whether a heading was found. Diagnostic only.
    pub fn heading_found(&self) -> bool {
        self.heading.is_some()
    }
}

/// Locate the bibliography section with the default configuration.
pub fn locate_bibliography_section(text: &str) -> BibliographySection<'_> {
    locate_with_config(text, &ParsingConfig::default())
}

/// Byte offset and content (without line terminator) of every line.
fn line_spans(text: &str) -> Vec<(usize, &str)> {
    let mut spans = Vec::new();
    let mut offset = 0;
    for piece in text.split_inclusive('\n') {
        spans.push((offset, piece.trim_end_matches(['\n', '\r'])));
        offset += piece.len();
    }
    spans
}

pub(crate) fn locate_with_config<'a>(text: &'a str, config: &ParsingConfig) -> BibliographySection<'a> {
    let heading_re = config.section_header_re.as_ref().unwrap_or(&*HEADING_RE);
    let end_re = config.section_end_re.as_ref().unwrap_or(&*SECTION_END_RE);
    let lines = line_spans(text);

    for (i, &(_, line)) in lines.iter().enumerate() {
        if !heading_re.is_match(line) {
            continue;
        }

        // Blank lines between the heading and the first entry are skipped;
        // after that the section runs until a blank line, a new heading-like
        // line or the end of the text.
        let mut body = lines[i + 1..]
            .iter()
            .skip_while(|(_, l)| l.trim().is_empty())
            .take_while(|(_, l)| !l.trim().is_empty() && !end_re.is_match(l))
            .peekable();
        let Some(&&(start, _)) = body.peek() else {
            tracing::debug!(heading = line.trim(), "bibliography heading has no body, trying next");
            continue;
        };
        let end = body.last().map(|&(offset, l)| offset + l.len()).unwrap_or(start);

        tracing::debug!(heading = line.trim(), bytes = end - start, "bibliography heading found");
        return BibliographySection {
            text: &text[start..end],
            heading: Some(line.trim()),
        };
    }

    let keep = config.fallback_lines.min(lines.len());
    let start = lines
        .len()
        .checked_sub(keep)
        .and_then(|first| lines.get(first))
        .map(|&(offset, _)| offset)
        .unwrap_or(0);
    tracing::debug!(lines = keep, "no bibliography heading, using trailing lines");
    BibliographySection {
        text: text[start..].trim(),
        heading: None,
    }
}
