//! HTML page fetching and text extraction.

use citeharvest_core::{AcquiredText, AcquisitionError, DocumentMetadata};
use citeharvest_parsing::text_processing::collapse_whitespace;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};

static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());

/// Elements whose text never reaches the extracted content.
const SKIPPED: &[&str] = &["head", "script", "style", "meta", "link", "noscript", "template"];

/// Elements that start a new line of output.
const BLOCKS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol",
    "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Parse `source` as an absolute http(s) URL with a host.
pub fn validate_url(source: &str) -> Result<reqwest::Url, AcquisitionError> {
    let url =
        reqwest::Url::parse(source).map_err(|e| AcquisitionError::InvalidUrl(format!("{source}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none_or(str::is_empty) {
        return Err(AcquisitionError::InvalidUrl(source.to_string()));
    }
    Ok(url)
}

/// Extract the page title and the visible text of an HTML document.
///
/// Text is returned one block per line with whitespace collapsed and empty
/// lines dropped.
pub fn html_to_text(html: &str) -> (Option<String>, String) {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SEL)
        .next()
        .map(|t| collapse_whitespace(&t.text().collect::<String>()))
        .filter(|t| !t.is_empty());

    let mut raw = String::new();
    push_text(document.root_element(), &mut raw);

    let content = raw
        .lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    (title, content)
}

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            // Source line breaks are plain whitespace in HTML.
            Node::Text(text) => out.extend(text.chars().map(|c| if c == '\n' { ' ' } else { c })),
            Node::Element(_) => {
                let Some(el) = ElementRef::wrap(child) else {
                    continue;
                };
                let name = el.value().name();
                if SKIPPED.contains(&name) {
                    continue;
                }
                let block = BLOCKS.contains(&name);
                if block {
                    out.push('\n');
                }
                push_text(el, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Turn a fetched HTML body into [`AcquiredText`].
pub(crate) fn page_text(
    url: &str,
    html: &str,
    content_type: String,
) -> Result<AcquiredText, AcquisitionError> {
    let (title, content) = html_to_text(html);
    if content.is_empty() {
        return Err(AcquisitionError::EmptyContent(url.to_string()));
    }
    Ok(AcquiredText {
        content,
        metadata: DocumentMetadata {
            title,
            content_type: Some(content_type).filter(|c| !c.is_empty()),
            ..Default::default()
        },
        source: url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>  Attention   Is All You Need </title>
  <meta name="description" content="hidden">
  <style>body { color: red; }</style>
  <script>var x = "hidden";</script>
</head>
<body>
  <h1>Attention Is All You Need</h1>
  <p>The dominant   sequence transduction models are based on
     <em>complex</em> recurrent networks.</p>
  <noscript>Enable JavaScript</noscript>
  <ul><li>[1] Bahdanau, D. Neural machine translation. 2014.</li><li>[2] Cho, K. Learning phrase representations. 2014.</li></ul>
</body>
</html>"#;

    #[test]
    fn test_html_to_text() {
        let (title, content) = html_to_text(PAGE);
        assert_eq!(title.as_deref(), Some("Attention Is All You Need"));
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Attention Is All You Need",
                "The dominant sequence transduction models are based on complex recurrent networks.",
                "[1] Bahdanau, D. Neural machine translation. 2014.",
                "[2] Cho, K. Learning phrase representations. 2014.",
            ]
        );
        assert!(!content.contains("hidden"));
        assert!(!content.contains("color"));
        assert!(!content.contains("JavaScript"));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.org/page").is_ok());
        assert!(matches!(
            validate_url("not a url"),
            Err(AcquisitionError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_url("ftp://example.org/file"),
            Err(AcquisitionError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_empty_page() {
        let err = page_text("https://example.org", "<html><body>  </body></html>", String::new())
            .unwrap_err();
        assert!(matches!(err, AcquisitionError::EmptyContent(_)));
    }
}
