//! Citation-format matchers.
//!
//! Each matcher recognises one formatting convention and returns one
//! [`Reference`] per entry it recognises. Lines it cannot place contribute
//! nothing.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{MatcherKind, ParsingConfig};
use crate::identifiers::{extract_doi, extract_year, leading_clause};
use crate::text_processing::normalize_entry;
use citeharvest_core::Reference;

/// A strategy recognising one citation-formatting convention.
pub trait ReferenceMatcher: Send + Sync {
    fn name(&self) -> &str;

    /// Extract references from a bibliography section, in section order.
    fn extract(&self, section: &str, config: &ParsingConfig) -> Vec<Reference>;
}

/// The built-in matcher for `kind`.
pub fn matcher_for(kind: MatcherKind) -> Box<dyn ReferenceMatcher> {
    match kind {
        MatcherKind::Numbered => Box::new(NumberedMatcher),
        MatcherKind::Harvard => Box::new(HarvardMatcher),
        MatcherKind::AuthorLeading => Box::new(AuthorLeadingMatcher),
    }
}

/// `Surname, I.` with optional further initials (`Smith, J. A.`, `Lee, J.-H.`).
const AUTHOR: &str = r"\p{Lu}[\p{L}'’\-]*\p{Ll},\s*\p{Lu}\.(?:\s*-?\p{Lu}\.)*";

// ── Numbered ──

/// `[N]`, `(N).` or `N.` opening a line, followed by the entry body.
static MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\[(\d{1,4})\]\s*|\(?(\d{1,3})\)?\.\s+)(\S.*)$").unwrap());

/// A capitalised body with at least one sentence-terminated clause
/// followed by more text.
static NUMBERED_BODY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\p{Lu}[^.]*\.\s*\S").unwrap());

/// Numbered style: `[1] Smith, J. Title. 2020.`
pub struct NumberedMatcher;

struct NumberedEntry<'a> {
    ref_num: String,
    lines: Vec<&'a str>,
}

impl ReferenceMatcher for NumberedMatcher {
    fn name(&self) -> &str {
        MatcherKind::Numbered.name()
    }

    fn extract(&self, section: &str, config: &ParsingConfig) -> Vec<Reference> {
        let mut entries: Vec<NumberedEntry> = Vec::new();
        let mut current: Option<NumberedEntry> = None;

        for line in section.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if let Some(caps) = MARKER_RE.captures(line) {
                entries.extend(current.take());
                let ref_num = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
                current = Some(NumberedEntry {
                    ref_num: ref_num.to_string(),
                    lines: vec![caps.get(3).map_or("", |m| m.as_str())],
                });
            } else if let Some(entry) = current.as_mut() {
                entry.lines.push(line);
            }
        }
        entries.extend(current);

        entries
            .into_iter()
            .filter_map(|entry| {
                let raw = entry.lines.join("\n");
                if !NUMBERED_BODY_RE.is_match(&raw) {
                    tracing::trace!(ref_num = %entry.ref_num, "numbered marker without citation body");
                    return None;
                }
                let text = normalize_entry(&raw, config);
                let author = leading_clause(&text);
                let year = extract_year(&text);
                Some(
                    Reference::new(text)?
                        .with_ref_num(Some(entry.ref_num))
                        .with_author(author)
                        .with_year(year)
                        .with_doi(extract_doi(&raw)),
                )
            })
            .collect()
    }
}

// ── Author-year styles ──

static HARVARD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?s)^(?P<authors>{a}(?:\s*,?\s*(?:and|&)\s*{a})*)?\s*\((?P<year>\d{{4}})[a-z]?\)\.?\s*(?P<rest>[^.]+\..*)$",
        a = AUTHOR
    ))
    .unwrap()
});

static AUTHOR_LEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?s)^(?P<authors>{a}(?:\s*(?:,\s*(?:and\s+|&\s*)?|and\s+|&\s*){a})*)\s*(?:\((?P<year>\d{{4}})[a-z]?\))?\.?\s*(?P<rest>[^.]+\..*)$",
        a = AUTHOR
    ))
    .unwrap()
});

/// Harvard style: `Smith, J. and Doe, A. (2020). Title. Venue.`
pub struct HarvardMatcher;

/// Author-leading style: `Smith, J., Doe, A. Title. Venue, 2020.`, with the
/// parenthesised year optional.
pub struct AuthorLeadingMatcher;

impl ReferenceMatcher for HarvardMatcher {
    fn name(&self) -> &str {
        MatcherKind::Harvard.name()
    }

    fn extract(&self, section: &str, config: &ParsingConfig) -> Vec<Reference> {
        match_author_year(&HARVARD_RE, section, config)
    }
}

impl ReferenceMatcher for AuthorLeadingMatcher {
    fn name(&self) -> &str {
        MatcherKind::AuthorLeading.name()
    }

    fn extract(&self, section: &str, config: &ParsingConfig) -> Vec<Reference> {
        match_author_year(&AUTHOR_LEADING_RE, section, config)
    }
}

/// Split a section into candidate entries. An entry ends at a blank line or
/// before a line that starts with an uppercase letter.
fn author_year_chunks(section: &str) -> Vec<String> {
    let mut chunks: Vec<Vec<&str>> = Vec::new();
    let mut open = false;
    for line in section.lines().map(str::trim) {
        if line.is_empty() {
            open = false;
            continue;
        }
        let starts_upper = line.chars().next().is_some_and(char::is_uppercase);
        match chunks.last_mut() {
            Some(chunk) if open && !starts_upper => chunk.push(line),
            _ => chunks.push(vec![line]),
        }
        open = true;
    }
    chunks.into_iter().map(|lines| lines.join("\n")).collect()
}

fn match_author_year(re: &Regex, section: &str, config: &ParsingConfig) -> Vec<Reference> {
    author_year_chunks(section)
        .into_iter()
        .filter_map(|raw| {
            let caps = re.captures(&raw)?;
            let text = normalize_entry(&raw, config);
            let author = leading_clause(&text);
            let year = caps
                .name("year")
                .map(|m| m.as_str().to_string())
                .or_else(|| extract_year(&text));
            let title = caps
                .name("rest")
                .and_then(|m| leading_clause(&normalize_entry(m.as_str(), config)));
            let doi = extract_doi(&raw);
            Some(
                Reference::new(text)?
                    .with_author(author)
                    .with_year(year)
                    .with_title(title)
                    .with_doi(doi),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ParsingConfig {
        ParsingConfig::default()
    }

    #[test]
    fn test_numbered_bracket_entries() {
        let section = "[1] Smith, J. A Great Paper. 2020.\n[2] Doe, A. Another Paper. 2019.";
        let refs = NumberedMatcher.extract(section, &config());
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].ref_num(), Some("1"));
        assert_eq!(refs[0].text(), "Smith, J. A Great Paper. 2020.");
        assert_eq!(refs[0].author(), Some("Smith, J"));
        assert_eq!(refs[0].year(), Some("2020"));
        assert_eq!(refs[1].ref_num(), Some("2"));
        assert_eq!(refs[1].year(), Some("2019"));
        assert_eq!(refs[1].title(), None);
    }

    #[test]
    fn test_numbered_continuation_lines() {
        let section = "1. Smith, J. Learning to detec-\ntion citations. In Proc. of\nthe Venue, 2018.\n\n2. Doe, A. Second. 2017.";
        let refs = NumberedMatcher.extract(section, &config());
        assert_eq!(refs.len(), 2);
        assert_eq!(
            refs[0].text(),
            "Smith, J. Learning to detection citations. In Proc. of the Venue, 2018."
        );
        assert_eq!(refs[1].ref_num(), Some("2"));
    }

    #[test]
    fn test_numbered_paren_marker_and_doi() {
        let section = "(3). Roe, B. Titled work. Journal, 2021. doi:10.1234/abcd.5678";
        let refs = NumberedMatcher.extract(section, &config());
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].ref_num(), Some("3"));
        assert_eq!(refs[0].doi(), Some("10.1234/abcd.5678"));
    }

    #[test]
    fn test_numbered_rejects_uncapitalised_or_single_clause_bodies() {
        let section = "[1] lowercase start. More text.\n[2] Only one clause.\n[3] Valid, A. Entry here.";
        let refs = NumberedMatcher.extract(section, &config());
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].ref_num(), Some("3"));
    }

    #[test]
    fn test_numbered_ignores_lines_before_first_marker() {
        let section = "Some stray header line\n[1] Smith, J. A Great Paper. 2020.";
        let refs = NumberedMatcher.extract(section, &config());
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].text(), "Smith, J. A Great Paper. 2020.");
    }

    #[test]
    fn test_harvard_entries() {
        let section = "Smith, J. (2020). Deep learning for citations. Journal of X, 1(2), 3-4.\n\
                       Doe, A. and Roe, B. (2019). Another title. In Proc. of\n\
                       the Venue, pp. 1-2.";
        let refs = HarvardMatcher.extract(section, &config());
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].author(), Some("Smith, J"));
        assert_eq!(refs[0].year(), Some("2020"));
        assert_eq!(refs[0].title(), Some("Deep learning for citations"));
        assert_eq!(refs[1].author(), Some("Doe, A"));
        assert_eq!(refs[1].title(), Some("Another title"));
        assert_eq!(
            refs[1].text(),
            "Doe, A. and Roe, B. (2019). Another title. In Proc. of the Venue, pp. 1-2."
        );
        assert_eq!(refs[1].ref_num(), None);
    }

    #[test]
    fn test_harvard_requires_parenthesised_year() {
        let section = "Smith, J., Doe, A. Learning to cite. Proc. Venue, 2018.";
        assert!(HarvardMatcher.extract(section, &config()).is_empty());
    }

    #[test]
    fn test_author_leading_entries() {
        let section = "Smith, J., Doe, A., and Roe, B. Learning to cite. Proc. Venue, 2018.\n\
                       Lee, K. Another approach. Journal Y, 2017.";
        let refs = AuthorLeadingMatcher.extract(section, &config());
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].author(), Some("Smith, J"));
        assert_eq!(refs[0].title(), Some("Learning to cite"));
        assert_eq!(refs[0].year(), Some("2018"));
        assert_eq!(refs[1].author(), Some("Lee, K"));
        assert_eq!(refs[1].year(), Some("2017"));
    }

    #[test]
    fn test_author_year_chunks_split_on_capital_or_blank() {
        let chunks = author_year_chunks("Smith, J. (2020). T. V.\ncontinued\n\nlower start\nNext, A. (2019). U. W.");
        assert_eq!(
            chunks,
            vec![
                "Smith, J. (2020). T. V.\ncontinued".to_string(),
                "lower start".to_string(),
                "Next, A. (2019). U. W.".to_string(),
            ]
        );
    }

    #[test]
    fn test_matcher_for_names() {
        for kind in MatcherKind::ALL {
            assert_eq!(matcher_for(kind).name(), kind.name());
        }
    }
}
