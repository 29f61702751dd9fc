use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ParsingConfig;

/// Suffixes that mark a hyphenated compound ("data- driven") rather than a
/// syllable split at a line break.
pub(crate) const COMPOUND_SUFFIXES: &[&str] = &[
    "based",
    "driven",
    "aware",
    "oriented",
    "specific",
    "related",
    "dependent",
    "independent",
    "like",
    "free",
    "friendly",
    "scale",
    "level",
    "order",
    "grained",
    "agnostic",
    "sensitive",
    "efficient",
    "centered",
    "time",
    "world",
    "shot",
    "wise",
];

/// Expand typographic ligatures left behind by PDF text extraction.
pub fn expand_ligatures(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{FB00}' => out.push_str("ff"),
            '\u{FB01}' => out.push_str("fi"),
            '\u{FB02}' => out.push_str("fl"),
            '\u{FB03}' => out.push_str("ffi"),
            '\u{FB04}' => out.push_str("ffl"),
            '\u{FB05}' | '\u{FB06}' => out.push_str("st"),
            _ => out.push(c),
        }
    }
    out
}

/// Repair words split by a hyphen at a line break.
///
/// - `"detec-\ntion"` → `"detection"`
/// - `"data-\ndriven"` → `"data-driven"` (compound suffix)
/// - `"Qwen2- VL"` → `"Qwen2-VL"` (digit before the hyphen)
pub fn fix_hyphenation(text: &str) -> String {
    fix_hyphenation_with_config(text, &ParsingConfig::default())
}

pub(crate) fn fix_hyphenation_with_config(text: &str, config: &ParsingConfig) -> String {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\w)-\s+(\w+)").unwrap());

    let defaults: Vec<String> = COMPOUND_SUFFIXES.iter().map(|s| s.to_string()).collect();
    let suffixes: HashSet<String> = config.compound_suffixes.resolve(&defaults).into_iter().collect();

    RE.replace_all(text, |caps: &regex::Captures| {
        let before = &caps[1];
        let after = &caps[2];
        let keep_hyphen = before.chars().all(|c| c.is_ascii_digit())
            || suffixes.contains(&after.to_lowercase());
        if keep_hyphen {
            format!("{}-{}", before, after)
        } else {
            format!("{}{}", before, after)
        }
    })
    .into_owned()
}

/// Collapse every run of whitespace (newlines included) into one space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Turn the raw, possibly multi-line text of one entry into display text.
pub(crate) fn normalize_entry(raw: &str, config: &ParsingConfig) -> String {
    collapse_whitespace(&fix_hyphenation_with_config(&expand_ligatures(raw), config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParsingConfigBuilder;

    #[test]
    fn test_expand_ligatures() {
        assert_eq!(expand_ligatures("ﬁnding ﬂow"), "finding flow");
        assert_eq!(expand_ligatures("eﬃcient oﬄine"), "efficient offline");
        assert_eq!(expand_ligatures("no ligatures here"), "no ligatures here");
    }

    #[test]
    fn test_fix_hyphenation_syllable_break() {
        assert_eq!(fix_hyphenation("detec- tion"), "detection");
        assert_eq!(fix_hyphenation("detec-\ntion"), "detection");
    }

    #[test]
    fn test_fix_hyphenation_keeps_compounds_and_model_names() {
        assert_eq!(fix_hyphenation("data-\ndriven"), "data-driven");
        assert_eq!(fix_hyphenation("task- agnostic,"), "task-agnostic,");
        assert_eq!(fix_hyphenation("pages 12- 15"), "pages 12-15");
        assert_eq!(fix_hyphenation("well-known"), "well-known");
    }

    #[test]
    fn test_custom_compound_suffix() {
        let config = ParsingConfigBuilder::new()
            .add_compound_suffix("powered".to_string())
            .build()
            .unwrap();
        assert_eq!(fix_hyphenation_with_config("AI- powered", &config), "AI-powered");
        assert_eq!(fix_hyphenation_with_config("detec- tion", &config), "detection");
    }

    #[test]
    fn test_normalize_entry() {
        let config = ParsingConfig::default();
        let raw = "Smith, J. Efﬁcient detec-\n  tion of\tcitations.\n2020.";
        assert_eq!(
            normalize_entry(raw, &config),
            "Smith, J. Efficient detection of citations. 2020."
        );
    }
}
