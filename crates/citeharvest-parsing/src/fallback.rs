use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ParsingConfig;
use crate::text_processing::normalize_entry;
use citeharvest_core::Reference;

/// `1.`, an opening bracket or paren, or `Surname, I.` at the start of a line.
static ENTRY_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\d+\.|[\[(]|\p{Lu}\p{Ll}+,\s*\p{Lu}\.)").unwrap());

/// Group the lines of a section into entries when no matcher recognised it.
///
/// A line opens a new entry when it looks like an entry start; every other
/// non-blank line continues the current one, so each non-blank line ends up
/// in exactly one entry. Only `text` is populated.
pub fn accumulate_entries(section: &str, config: &ParsingConfig) -> Vec<Reference> {
    let mut entries: Vec<Vec<&str>> = Vec::new();
    for line in section.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match entries.last_mut() {
            Some(entry) if !ENTRY_START_RE.is_match(line) => entry.push(line),
            _ => entries.push(vec![line]),
        }
    }

    entries
        .into_iter()
        .filter_map(|lines| Reference::new(normalize_entry(&lines.join("\n"), config)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_line_is_attributed() {
        let section = "Some heading text\n[a] weird entry\ncontinued here\n\n(b) another\nmore";
        let refs = accumulate_entries(section, &ParsingConfig::default());
        let texts: Vec<&str> = refs.iter().map(|r| r.text()).collect();
        assert_eq!(
            texts,
            vec!["Some heading text", "[a] weird entry continued here", "(b) another more"]
        );
        assert!(refs.iter().all(|r| r.author().is_none() && r.year().is_none()));
    }

    #[test]
    fn test_author_and_number_starts() {
        let section = "12. first entry\nwraps\nSmith, J. second entry 2020\nthird line";
        let refs = accumulate_entries(section, &ParsingConfig::default());
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[1].text(), "Smith, J. second entry 2020 third line");
        assert_eq!(refs[1].year(), None);
    }

    #[test]
    fn test_blank_section() {
        assert!(accumulate_entries("\n  \n", &ParsingConfig::default()).is_empty());
    }
}
