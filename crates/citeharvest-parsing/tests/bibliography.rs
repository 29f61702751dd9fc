//! End-to-end parsing of document text: section location, matcher
//! selection and field extraction together.

use citeharvest_parsing::{PatternReferenceParser, locate_bibliography_section};

const PAPER: &str = "\
Learning Things From Citations

1 Introduction
Prior work [1, 2] studied this at length. See also [3].

References
[1] Smith, J. A Great Paper. 2020.
[2] Doe, A. Another Paper. In Proceedings of the
Conference on Things, 2019. doi:10.1234/abcd.5678
[3] Roe, B. and Lee, K. Third Paper. Journal of
Stuff, 12(3), 2018.

This closing paragraph is not part of the bibliography. It has no
citations but mentions 1999 and 10.9999/not-a-ref for good measure.
";

#[test]
fn numbered_example_yields_two_references() {
    let text = "[1] Smith, J. A Great Paper. 2020.\n[2] Doe, A. Another Paper. 2019.";
    let refs = PatternReferenceParser::new().parse_document(text);
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].ref_num(), Some("1"));
    assert_eq!(refs[0].year(), Some("2020"));
    assert_eq!(refs[1].ref_num(), Some("2"));
    assert_eq!(refs[1].year(), Some("2019"));
}

#[test]
fn section_excludes_trailing_prose() {
    let section = locate_bibliography_section(PAPER);
    assert_eq!(section.heading, Some("References"));
    assert!(section.text.starts_with("[1] Smith"));
    assert!(section.text.ends_with("Stuff, 12(3), 2018."));
    assert!(!section.text.contains("closing paragraph"));
}

#[test]
fn full_document_fields() {
    let refs = PatternReferenceParser::new().parse_document(PAPER);
    assert_eq!(refs.len(), 3);

    assert_eq!(refs[1].ref_num(), Some("2"));
    assert_eq!(refs[1].doi(), Some("10.1234/abcd.5678"));
    assert_eq!(refs[1].year(), Some("2019"));
    assert_eq!(refs[1].author(), Some("Doe, A"));

    assert_eq!(
        refs[2].text(),
        "Roe, B. and Lee, K. Third Paper. Journal of Stuff, 12(3), 2018."
    );
    assert_eq!(refs[2].doi(), None);
    assert!(refs.iter().all(|r| !r.text().is_empty()));
}

#[test]
fn parsing_is_idempotent() {
    let parser = PatternReferenceParser::new();
    assert_eq!(parser.parse_document(PAPER), parser.parse_document(PAPER));
}

#[test]
fn harvard_bibliography_without_numbers() {
    let text = "Body.\n\nBibliography\n\
                Smith, J. (2020). Deep learning for citations. Journal of X.\n\
                Doe, A. and Roe, B. (2019). Another title. Proc. Y, doi:10.5555/xyz.1.\n";
    let refs = PatternReferenceParser::new().parse_document(text);
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].ref_num(), None);
    assert_eq!(refs[0].title(), Some("Deep learning for citations"));
    assert_eq!(refs[0].author(), Some("Smith, J"));
    assert_eq!(refs[1].author(), Some("Doe, A"));
    assert_eq!(refs[1].doi(), Some("10.5555/xyz.1"));
}

#[test]
fn headingless_document_uses_fallback_lines() {
    let text = "Some body text that never names its bibliography\n\
                [1] Smith, J. A Great Paper. 2020.";
    let parser = PatternReferenceParser::new();
    assert!(!parser.locate_section(text).heading_found());
    let refs = parser.parse_document(text);
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].ref_num(), Some("1"));
}

#[test]
fn doi_ending_a_line_keeps_following_year_out() {
    let section = "[1] Smith, J. A Great Paper. doi:10.1234/abcd.5678\n2020. Some Venue.\n\
                   [2] Doe, A. Another Paper. 2019.";
    let refs = PatternReferenceParser::new().parse_section(section);
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].doi(), Some("10.1234/abcd.5678"));
    assert_eq!(refs[0].year(), Some("2020"));
    assert_eq!(refs[1].doi(), None);
}

#[test]
fn author_is_leading_clause_in_every_style() {
    let parser = PatternReferenceParser::new();
    let harvard = parser.parse_section("Smith, J. (2020). Deep learning. Journal of X.");
    assert_eq!(harvard[0].author(), Some("Smith, J"));
    assert_eq!(harvard[0].title(), Some("Deep learning"));

    let numbered = parser.parse_section("[1] Smith, J. A Great Paper. 2020.");
    assert_eq!(numbered[0].author(), Some("Smith, J"));
}
