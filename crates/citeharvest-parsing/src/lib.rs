//! Pattern-based reference extraction from plain document text.
//!
//! Pipeline:
//! 1. Locate the bibliography section ([`section`])
//! 2. Run the format matchers in priority order, keeping the first
//!    non-empty result ([`matchers`])
//! 3. If none fires, accumulate lines into entries ([`fallback`])

pub mod config;
pub mod fallback;
pub mod identifiers;
pub mod matchers;
pub mod parser;
pub mod section;
pub mod text_processing;

pub use config::{ListOverride, MatcherKind, ParsingConfig, ParsingConfigBuilder};
pub use matchers::{AuthorLeadingMatcher, HarvardMatcher, NumberedMatcher, ReferenceMatcher};
pub use parser::PatternReferenceParser;
pub use section::{BibliographySection, locate_bibliography_section};
// Re-export domain types from core (canonical definitions live there)
pub use citeharvest_core::Reference;
