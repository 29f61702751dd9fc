use citeharvest_core::Reference;

use crate::config::ParsingConfig;
use crate::fallback::accumulate_entries;
use crate::matchers::{ReferenceMatcher, matcher_for};
use crate::section::{BibliographySection, locate_with_config};

/// Rule-based reference extraction over plain text.
///
/// Matchers run in priority order and the first one producing any reference
/// wins; results from different matchers are never merged. When none fires,
/// lines are accumulated into entries instead.
pub struct PatternReferenceParser {
    config: ParsingConfig,
    matchers: Vec<Box<dyn ReferenceMatcher>>,
}

impl Default for PatternReferenceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternReferenceParser {
    pub fn new() -> Self {
        Self::with_config(ParsingConfig::default())
    }

    /// Build the matchers listed in `config`.
    pub fn with_config(config: ParsingConfig) -> Self {
        let matchers = config.matchers.iter().map(|&kind| matcher_for(kind)).collect();
        Self { config, matchers }
    }

    /// Use a custom matcher list, ignoring `config`'s matcher kinds.
    pub fn with_matchers(config: ParsingConfig, matchers: Vec<Box<dyn ReferenceMatcher>>) -> Self {
        Self { config, matchers }
    }

    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    pub fn locate_section<'a>(&self, text: &'a str) -> BibliographySection<'a> {
        locate_with_config(text, &self.config)
    }

    /// Parse an already located bibliography section.
    pub fn parse_section(&self, section: &str) -> Vec<Reference> {
        for matcher in &self.matchers {
            let refs = matcher.extract(section, &self.config);
            if !refs.is_empty() {
                tracing::debug!(matcher = matcher.name(), count = refs.len(), "matcher fired");
                return refs;
            }
        }
        let refs = accumulate_entries(section, &self.config);
        tracing::debug!(count = refs.len(), "no matcher fired, accumulated lines");
        refs
    }

    /// Locate the bibliography in full document text and parse it.
    pub fn parse_document(&self, text: &str) -> Vec<Reference> {
        let section = self.locate_section(text);
        if !section.heading_found() {
            tracing::info!(
                lines = self.config.fallback_lines,
                "no bibliography heading found, parsing trailing lines"
            );
        }
        self.parse_section(section.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MatcherKind, ParsingConfigBuilder};

    struct Fixed(&'static str);

    impl ReferenceMatcher for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn extract(&self, _section: &str, _config: &ParsingConfig) -> Vec<Reference> {
            Reference::new(self.0).into_iter().collect()
        }
    }

    #[test]
    fn test_first_non_empty_matcher_wins() {
        let parser = PatternReferenceParser::with_matchers(
            ParsingConfig::default(),
            vec![Box::new(Fixed("")), Box::new(Fixed("second")), Box::new(Fixed("third"))],
        );
        let refs = parser.parse_section("anything");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].text(), "second");
    }

    #[test]
    fn test_numbered_beats_author_year_without_merging() {
        let section = "[1] Smith, J. A Great Paper. 2020.\n\
                       Doe, A. (2019). Harvard entry. Venue.";
        let refs = PatternReferenceParser::new().parse_section(section);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].ref_num(), Some("1"));
        // The Harvard-looking line is a continuation of entry 1.
        assert!(refs[0].text().ends_with("Harvard entry. Venue."));
    }

    #[test]
    fn test_disabled_matcher_falls_through() {
        let config = ParsingConfigBuilder::new()
            .matchers(vec![MatcherKind::AuthorLeading])
            .build()
            .unwrap();
        let refs = PatternReferenceParser::with_config(config)
            .parse_section("Smith, J. (2020). Title here. Venue.");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].year(), Some("2020"));
        assert_eq!(refs[0].title(), Some("Title here"));
    }

    #[test]
    fn test_fallback_when_nothing_matches() {
        let refs = PatternReferenceParser::new().parse_section("loose line one\nloose line two");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].text(), "loose line one loose line two");
    }
}
