use regex::Regex;

/// Controls how a list of values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }

    fn push(&mut self, value: T) {
        match self {
            ListOverride::Default => *self = ListOverride::Extend(vec![value]),
            ListOverride::Replace(v) | ListOverride::Extend(v) => v.push(value),
        }
    }
}

/// Bibliography headings recognised out of the box.
pub const DEFAULT_HEADINGS: &[&str] = &[
    "References",
    "Bibliography",
    "Works Cited",
    "Literature Cited",
];

/// One citation-format matcher family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherKind {
    /// `[N]`, `(N).` or `N.` at the start of an entry.
    Numbered,
    /// `Author, I. and Author2, I. (YYYY). Title...`
    Harvard,
    /// `Author, I., Author2, I.` followed by an optional `(YYYY)` and the title.
    AuthorLeading,
}

impl MatcherKind {
    /// Built-in priority order.
    pub const ALL: [MatcherKind; 3] = [
        MatcherKind::Numbered,
        MatcherKind::Harvard,
        MatcherKind::AuthorLeading,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MatcherKind::Numbered => "numbered",
            MatcherKind::Harvard => "harvard",
            MatcherKind::AuthorLeading => "author-leading",
        }
    }
}

/// Configuration for pattern-based reference parsing.
///
/// Regex fields are `Option<Regex>`; `None` means "use the built-in default".
/// Use [`ParsingConfigBuilder`] to construct with string patterns.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    // ── section.rs ──
    /// Regex matching a whole bibliography heading line. Built from the
    /// heading keywords when they are overridden.
    pub(crate) section_header_re: Option<Regex>,
    /// Regex matching a line that ends the bibliography section.
    pub(crate) section_end_re: Option<Regex>,
    /// Number of trailing lines used when no heading is found.
    pub(crate) fallback_lines: usize,

    // ── parser.rs ──
    /// Matchers to try, in priority order.
    pub(crate) matchers: Vec<MatcherKind>,

    // ── text_processing.rs ──
    /// Compound-word suffixes that should preserve the hyphen.
    pub(crate) compound_suffixes: ListOverride<String>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            section_header_re: None,
            section_end_re: None,
            fallback_lines: citeharvest_core::DEFAULT_FALLBACK_LINES,
            matchers: MatcherKind::ALL.to_vec(),
            compound_suffixes: ListOverride::Default,
        }
    }
}

impl ParsingConfig {
    pub fn fallback_lines(&self) -> usize {
        self.fallback_lines
    }

    pub fn matchers(&self) -> &[MatcherKind] {
        &self.matchers
    }
}

/// Builder for [`ParsingConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast with `regex::Error` if any pattern is invalid.
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    section_header_re: Option<String>,
    section_end_re: Option<String>,
    headings: ListOverride<String>,
    fallback_lines: Option<usize>,
    matchers: Option<Vec<MatcherKind>>,
    compound_suffixes: ListOverride<String>,
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the runtime configuration: fallback size and extra headings.
    pub fn from_config(config: &citeharvest_core::Config) -> Self {
        let mut builder = Self::new().fallback_lines(config.fallback_lines);
        for heading in &config.extra_headings {
            builder = builder.add_heading(heading.clone());
        }
        builder
    }

    // ── Section header / end ──

    /// Override the heading regex. Takes precedence over heading keywords.
    pub fn section_header_regex(mut self, pattern: &str) -> Self {
        self.section_header_re = Some(pattern.to_string());
        self
    }

    pub fn section_end_regex(mut self, pattern: &str) -> Self {
        self.section_end_re = Some(pattern.to_string());
        self
    }

    pub fn set_headings(mut self, headings: Vec<String>) -> Self {
        self.headings = ListOverride::Replace(headings);
        self
    }

    pub fn add_heading(mut self, heading: String) -> Self {
        self.headings.push(heading);
        self
    }

    pub fn fallback_lines(mut self, n: usize) -> Self {
        self.fallback_lines = Some(n);
        self
    }

    // ── Matchers ──

    /// Restrict and reorder the matchers. Earlier entries win.
    pub fn matchers(mut self, matchers: Vec<MatcherKind>) -> Self {
        self.matchers = Some(matchers);
        self
    }

    // ── Compound suffixes ──

    pub fn set_compound_suffixes(mut self, suffixes: Vec<String>) -> Self {
        self.compound_suffixes = ListOverride::Replace(suffixes);
        self
    }

    pub fn add_compound_suffix(mut self, suffix: String) -> Self {
        self.compound_suffixes.push(suffix);
        self
    }

    /// Compile all string patterns into regexes and produce a [`ParsingConfig`].
    pub fn build(self) -> Result<ParsingConfig, regex::Error> {
        let compile = |opt: Option<String>| -> Result<Option<Regex>, regex::Error> {
            opt.map(|p| Regex::new(&p)).transpose()
        };

        let section_header_re = match (self.section_header_re, &self.headings) {
            (Some(pattern), _) => Some(Regex::new(&pattern)?),
            (None, ListOverride::Default) => None,
            (None, headings) => {
                let defaults: Vec<String> = DEFAULT_HEADINGS.iter().map(|h| h.to_string()).collect();
                Some(Regex::new(&heading_pattern(&headings.resolve(&defaults)))?)
            }
        };

        Ok(ParsingConfig {
            section_header_re,
            section_end_re: compile(self.section_end_re)?,
            fallback_lines: self
                .fallback_lines
                .unwrap_or(citeharvest_core::DEFAULT_FALLBACK_LINES),
            matchers: self.matchers.unwrap_or_else(|| MatcherKind::ALL.to_vec()),
            compound_suffixes: self.compound_suffixes,
        })
    }
}

/// Build a whole-line, case-insensitive heading regex for `headings`.
///
/// The heading may carry a section number (`7`, `7.`, `VII.`) and a trailing
/// colon. Spaces inside a keyword match any run of whitespace.
pub fn heading_pattern<S: AsRef<str>>(headings: &[S]) -> String {
    let alternatives: Vec<String> = headings
        .iter()
        .map(|h| {
            h.as_ref()
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .filter(|h| !h.is_empty())
        .collect();
    format!(
        r"(?i)^\s*(?:(?:\d+(?:\.\d+)*|[IVXLC]+)\.?\s+)?(?:{})\s*:?\s*$",
        alternatives.join("|")
    )
}
