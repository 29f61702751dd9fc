use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Trailing characters that are sentence punctuation rather than part of a DOI.
const TRAILING_PUNCT: [char; 4] = ['.', ',', ';', ':'];

/// Drop trailing punctuation and closing brackets that have no opening
/// partner inside the DOI, e.g. `10.1016/0021-9681(87)90171-8).` keeps the
/// balanced `(87)` but loses the final `).`.
fn clean_doi(doi: &str) -> String {
    let mut doi = doi.trim_end_matches(TRAILING_PUNCT);
    loop {
        let Some(last) = doi.chars().last() else {
            break;
        };
        let open = match last {
            ')' => '(',
            ']' => '[',
            '}' => '{',
            _ => break,
        };
        if doi.matches(last).count() <= doi.matches(open).count() {
            break;
        }
        doi = doi[..doi.len() - 1].trim_end_matches(TRAILING_PUNCT);
    }
    doi.to_string()
}

/// Rejoin DOIs that a PDF line break split in two.
///
/// A continuation that is only a 19xx/20xx year followed by punctuation or
/// the end of text is the entry's year, not the rest of the DOI.
fn rejoin_split_dois(text: &str) -> String {
    static SPLITS: Lazy<Vec<(Regex, bool)>> = Lazy::new(|| {
        [
            // "10.1145/3372297.\n3417880"
            (r"(10\.\d{4,}/[^\s\]>,]+\.)[ \t]*\n\s*(\d{3,})", true),
            // "10.1109/TIFS.2021\n.3050134" or mid-number splits
            (r"(10\.\d{4,}/[^\s\]>,]+\d)[ \t]*\n\s*(\.?\d+(?:\.\d+)*)", true),
            // "10.1016/0021-\n9681(87)90171-8"
            (r"(10\.\d{4,}/[^\s\]>,]+-)[ \t]*\n\s*(\S+)", false),
        ]
        .iter()
        .map(|(p, guard)| (Regex::new(p).unwrap(), *guard))
        .collect()
    });

    let mut fixed = text.to_string();
    for (re, guard_years) in SPLITS.iter() {
        fixed = re
            .replace_all(&fixed, |caps: &Captures| {
                let end = caps.get(0).map_or(0, |m| m.end());
                let next = fixed[end..].chars().next();
                if *guard_years && is_year_line_start(&caps[2], next) {
                    caps[0].to_string()
                } else {
                    format!("{}{}", &caps[1], &caps[2])
                }
            })
            .into_owned();
    }
    fixed
}

fn is_year_line_start(continuation: &str, next: Option<char>) -> bool {
    static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:19|20)\d{2}$").unwrap());
    YEAR.is_match(continuation)
        && next.is_none_or(|c| c.is_whitespace() || c.is_ascii_punctuation())
}

/// Extract a DOI from reference text.
///
/// Tried in order: an explicit `doi:` label (any case), a `doi.org`
/// URL, then a bare `10.NNNN/...` anywhere in the text.
pub fn extract_doi(text: &str) -> Option<String> {
    static LABELED: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\bdoi\s*:?\s*(10\.\d{4,}(?:\.\d+)*/[^\s\]>},]+)").unwrap()
    });
    static URL: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)https?://(?:dx\.)?doi\.org/(10\.\d{4,}/[^\s\]>},]+)").unwrap()
    });
    static BARE: Lazy<Regex> = Lazy::new(|| Regex::new(r"10\.\d{4,}/[^\s\]>},]+").unwrap());

    let text = rejoin_split_dois(text);
    let found = LABELED
        .captures(&text)
        .or_else(|| URL.captures(&text))
        .and_then(|caps| caps.get(1))
        .or_else(|| BARE.find(&text))
        .map(|m| clean_doi(m.as_str()))?;

    // Needs a non-empty suffix after the slash to be a DOI at all.
    match found.split_once('/') {
        Some((_, suffix)) if !suffix.is_empty() => Some(found),
        _ => None,
    }
}

/// First standalone year in 1900–2099, allowing a disambiguation letter
/// (`2020a`).
pub fn extract_year(text: &str) -> Option<String> {
    static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b((?:19|20)\d{2})[a-z]?\b").unwrap());
    YEAR.captures(text).map(|caps| caps[1].to_string())
}

/// The leading clause of an entry: everything before the first period.
pub fn leading_clause(text: &str) -> Option<String> {
    let clause = text.split('.').next()?.trim();
    if clause.is_empty() {
        None
    } else {
        Some(clause.to_string())
    }
}
