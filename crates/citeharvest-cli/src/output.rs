use std::io::Write;

use citeharvest_core::{Reference, ReferenceExtractionResult};
use citeharvest_ingest::ContentExtraction;
use citeharvest_parsing::BibliographySection;
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// One-line description of a reference: `[n] author (year) title DOI: doi`.
///
/// Absent parts are left out. With no descriptive field at all the raw
/// entry text stands in.
pub fn describe_reference(reference: &Reference) -> String {
    let mut parts = Vec::new();
    if let Some(author) = reference.author() {
        parts.push(author.to_string());
    }
    if let Some(year) = reference.year() {
        parts.push(format!("({year})"));
    }
    if let Some(title) = reference.title() {
        parts.push(title.to_string());
    }
    if let Some(doi) = reference.doi() {
        parts.push(format!("DOI: {doi}"));
    }
    if parts.is_empty() {
        parts.push(reference.text().to_string());
    }
    parts.join(" ")
}

/// Print the outcome of a reference extraction.
pub fn print_extraction(
    w: &mut dyn Write,
    result: &ReferenceExtractionResult,
    color: ColorMode,
) -> std::io::Result<()> {
    if let Some(error) = result.error() {
        let line = format!("Error extracting references: {}", error);
        if color.enabled() {
            writeln!(w, "{}", line.red())?;
        } else {
            writeln!(w, "{}", line)?;
        }
        return Ok(());
    }

    if result.references().is_empty() {
        writeln!(w, "No references found in the document.")?;
        return Ok(());
    }

    writeln!(w, "Extracted {} references from the document:", result.count())?;
    writeln!(w)?;
    for (i, reference) in result.references().iter().enumerate() {
        let index = reference
            .ref_num()
            .map(str::to_string)
            .unwrap_or_else(|| (i + 1).to_string());
        let label = format!("[{}]", index);
        let description = describe_reference(reference);
        if color.enabled() {
            writeln!(w, "{} {}", label.bold(), description)?;
        } else {
            writeln!(w, "{} {}", label, description)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

/// Print acquired document text with its metadata.
pub fn print_content(
    w: &mut dyn Write,
    extraction: &ContentExtraction,
    color: ColorMode,
) -> std::io::Result<()> {
    let meta = &extraction.metadata;
    let mut fields: Vec<(&str, String)> = vec![("Source", extraction.source.clone())];
    if let Some(title) = &meta.title {
        fields.push(("Title", title.clone()));
    }
    if let Some(author) = &meta.author {
        fields.push(("Author", author.clone()));
    }
    if let Some(pages) = meta.page_count {
        fields.push(("Pages", pages.to_string()));
    }
    if let Some(content_type) = &meta.content_type {
        fields.push(("Content type", content_type.clone()));
    }

    for (label, value) in &fields {
        if color.enabled() {
            writeln!(w, "{} {}", format!("{}:", label).bold(), value)?;
        } else {
            writeln!(w, "{}: {}", label, value)?;
        }
    }
    if extraction.truncated {
        let note = format!(
            "(truncated to {} of {} characters)",
            extraction.content.chars().count(),
            extraction.total_chars
        );
        if color.enabled() {
            writeln!(w, "{}", note.dimmed())?;
        } else {
            writeln!(w, "{}", note)?;
        }
    }
    writeln!(w)?;
    writeln!(w, "{}", extraction.content)?;
    Ok(())
}

/// Print a located bibliography section.
pub fn print_section(
    w: &mut dyn Write,
    section: &BibliographySection<'_>,
    fallback_lines: usize,
    color: ColorMode,
) -> std::io::Result<()> {
    let header = match section.heading {
        Some(heading) => format!("Bibliography heading: {}", heading.trim()),
        None => format!(
            "No bibliography heading found; showing the last {} lines",
            fallback_lines
        ),
    };
    if color.enabled() {
        writeln!(w, "{}", header.bold().cyan())?;
    } else {
        writeln!(w, "{}", header)?;
    }
    writeln!(w)?;
    writeln!(w, "{}", section.text)?;
    Ok(())
}
