//! Reader for the TEI-XML bibliography returned by the extraction service.
//!
//! Uses SAX-style event processing over `<biblStruct>` elements. Missing or
//! malformed fields are simply absent; malformed markup stops the read and
//! keeps the entries completed so far.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use citeharvest_core::Reference;

/// One `<biblStruct>` as read from the TEI response.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TeiBibl {
    /// `"Surname, Forename"` per person, in document order.
    pub authors: Vec<String>,
    pub year: Option<String>,
    pub title: Option<String>,
    pub doi: Option<String>,
}

impl TeiBibl {
    /// Build a [`Reference`] whose `text` summarises the parsed fields.
    ///
    /// Returns `None` when nothing usable was parsed.
    pub fn into_reference(self, position: usize) -> Option<Reference> {
        let author = (!self.authors.is_empty()).then(|| self.authors.join("; "));
        let parts = [
            author.clone(),
            self.year.as_ref().map(|y| format!("({})", y)),
            self.title.clone(),
            self.doi.as_ref().map(|d| format!("DOI: {}", d)),
        ];
        let text = parts.into_iter().flatten().collect::<Vec<_>>().join(". ");

        Some(
            Reference::new(text)?
                .with_ref_num(Some(position.to_string()))
                .with_author(author)
                .with_year(self.year)
                .with_title(self.title)
                .with_doi(self.doi),
        )
    }
}

/// Which field we're currently reading text for.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Surname,
    Forename,
    Title,
    Date,
    Doi,
}

impl Field {
    fn element_name(&self) -> &'static [u8] {
        match self {
            Field::Surname => b"surname",
            Field::Forename => b"forename",
            Field::Title => b"title",
            Field::Date => b"date",
            Field::Doi => b"idno",
        }
    }
}

#[derive(Default)]
struct Person {
    surname: String,
    forenames: Vec<String>,
}

impl Person {
    fn display(self) -> Option<String> {
        let surname = self.surname.trim();
        if surname.is_empty() {
            return None;
        }
        let forename = self.forenames.join(" ");
        Some(if forename.is_empty() {
            surname.to_string()
        } else {
            format!("{}, {}", surname, forename)
        })
    }
}

fn attribute(e: &BytesStart, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Leading four digits of a TEI date (`2019`, `2019-05-01`).
fn year_of(value: &str) -> Option<String> {
    let value = value.trim();
    let digits = value.get(..4)?;
    digits.chars().all(|c| c.is_ascii_digit()).then(|| digits.to_string())
}

/// Parse every `<biblStruct>` in a TEI document, in document order.
pub fn parse_bibl_structs(xml: &str) -> Vec<TeiBibl> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut bibls = Vec::new();

    // State
    let mut current: Option<TeiBibl> = None;
    let mut nested_bibl = 0usize;
    let mut person: Option<Person> = None;
    let mut reading: Option<Field> = None;
    let mut text_buf = String::new();

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(
                    position = reader.buffer_position(),
                    error = %e,
                    kept = bibls.len(),
                    "malformed TEI, stopping"
                );
                break;
            }
        };

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let local = e.local_name();
                let name = local.as_ref();

                if name == b"biblStruct" {
                    if current.is_some() {
                        if !is_empty {
                            nested_bibl += 1;
                        }
                    } else if !is_empty {
                        current = Some(TeiBibl::default());
                    }
                    continue;
                }
                let Some(bibl) = current.as_mut() else {
                    continue;
                };
                if reading.is_some() {
                    // Inline markup (<hi>, <lb/>) inside a field: keep accumulating.
                    continue;
                }

                match name {
                    b"persName" if !is_empty => person = Some(Person::default()),
                    b"surname" if person.is_some() => reading = Some(Field::Surname),
                    b"forename" if person.is_some() => reading = Some(Field::Forename),
                    b"title" if bibl.title.is_none() => reading = Some(Field::Title),
                    b"date" if bibl.year.is_none() => {
                        bibl.year = attribute(e, b"when").and_then(|w| year_of(&w));
                        if bibl.year.is_none() {
                            reading = Some(Field::Date);
                        }
                    }
                    b"idno"
                        if bibl.doi.is_none()
                            && attribute(e, b"type").is_some_and(|t| t.eq_ignore_ascii_case("doi")) =>
                    {
                        reading = Some(Field::Doi)
                    }
                    _ => {}
                }
                if is_empty {
                    reading = None;
                } else if reading.is_some() {
                    text_buf.clear();
                }
            }

            Event::Text(ref e) => {
                if reading.is_some() {
                    if let Ok(text) = e.unescape() {
                        text_buf.push_str(&text);
                    }
                }
            }

            Event::CData(ref e) => {
                if reading.is_some() {
                    text_buf.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }

            Event::End(ref e) => {
                let local = e.local_name();
                let name = local.as_ref();

                if let Some(field) = reading {
                    if name == field.element_name() {
                        let text = text_buf.split_whitespace().collect::<Vec<_>>().join(" ");
                        reading = None;
                        let Some(bibl) = current.as_mut() else {
                            continue;
                        };
                        match field {
                            Field::Surname => {
                                if let Some(p) = person.as_mut() {
                                    p.surname = text;
                                }
                            }
                            Field::Forename => {
                                if let Some(p) = person.as_mut().filter(|_| !text.is_empty()) {
                                    p.forenames.push(text);
                                }
                            }
                            Field::Title => bibl.title = Some(text).filter(|t| !t.is_empty()),
                            Field::Date => bibl.year = year_of(&text),
                            Field::Doi => bibl.doi = Some(text).filter(|t| !t.is_empty()),
                        }
                    }
                    continue;
                }

                match name {
                    b"persName" => {
                        if let (Some(bibl), Some(name)) =
                            (current.as_mut(), person.take().and_then(Person::display))
                        {
                            bibl.authors.push(name);
                        }
                    }
                    b"biblStruct" if nested_bibl > 0 => nested_bibl -= 1,
                    b"biblStruct" => bibls.extend(current.take()),
                    _ => {}
                }
            }

            Event::Eof => break,
            _ => {}
        }
    }

    bibls
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEI: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0">
<text><back><div><listBibl>
<biblStruct xml:id="b0">
  <analytic>
    <title level="a" type="main">Attention <hi rend="italic">is</hi> All You Need</title>
    <author><persName><forename type="first">Ashish</forename><surname>Vaswani</surname></persName></author>
    <author><persName><forename type="first">Noam</forename><forename type="middle">M</forename><surname>Shazeer</surname></persName></author>
    <idno type="DOI">10.5555/3295222.3295349</idno>
  </analytic>
  <monogr>
    <title level="m">Advances in Neural Information Processing Systems</title>
    <imprint><date type="published" when="2017-12-04">Dec 2017</date></imprint>
  </monogr>
</biblStruct>
<biblStruct xml:id="b1">
  <monogr>
    <title level="m">Untitled Monograph &amp; Notes</title>
    <imprint><date>2003</date></imprint>
  </monogr>
</biblStruct>
<biblStruct xml:id="b2"><monogr><imprint/></monogr></biblStruct>
</listBibl></div></back></text>
</TEI>"#;

    #[test]
    fn test_parse_fields() {
        let bibls = parse_bibl_structs(TEI);
        assert_eq!(bibls.len(), 3);

        assert_eq!(bibls[0].authors, vec!["Vaswani, Ashish", "Shazeer, Noam M"]);
        assert_eq!(bibls[0].title.as_deref(), Some("Attention is All You Need"));
        assert_eq!(bibls[0].year.as_deref(), Some("2017"));
        assert_eq!(bibls[0].doi.as_deref(), Some("10.5555/3295222.3295349"));

        assert!(bibls[1].authors.is_empty());
        assert_eq!(bibls[1].title.as_deref(), Some("Untitled Monograph & Notes"));
        assert_eq!(bibls[1].year.as_deref(), Some("2003"));
        assert_eq!(bibls[1].doi, None);

        assert_eq!(bibls[2], TeiBibl::default());
    }

    #[test]
    fn test_into_reference_text() {
        let bibls = parse_bibl_structs(TEI);
        let r = bibls[0].clone().into_reference(1).unwrap();
        assert_eq!(r.ref_num(), Some("1"));
        assert_eq!(r.author(), Some("Vaswani, Ashish; Shazeer, Noam M"));
        assert_eq!(
            r.text(),
            "Vaswani, Ashish; Shazeer, Noam M. (2017). Attention is All You Need. \
             DOI: 10.5555/3295222.3295349"
        );

        let r = bibls[1].clone().into_reference(2).unwrap();
        assert_eq!(r.text(), "(2003). Untitled Monograph & Notes");
        assert_eq!(r.author(), None);

        assert!(bibls[2].clone().into_reference(3).is_none());
    }

    #[test]
    fn test_person_without_surname_is_skipped() {
        let xml = r#"<listBibl><biblStruct><analytic>
            <author><persName><forename>Solo</forename></persName></author>
            <author><persName><surname>Knuth</surname></persName></author>
            <title>Art</title></analytic></biblStruct></listBibl>"#;
        let bibls = parse_bibl_structs(xml);
        assert_eq!(bibls[0].authors, vec!["Knuth"]);
    }

    #[test]
    fn test_malformed_xml_keeps_completed_entries() {
        let xml = r#"<listBibl>
            <biblStruct><analytic><title>First</title></analytic></biblStruct>
            <biblStruct><analytic><title>Broken</analytic></biblStruct>"#;
        let bibls = parse_bibl_structs(xml);
        assert_eq!(bibls.len(), 1);
        assert_eq!(bibls[0].title.as_deref(), Some("First"));
    }

    #[test]
    fn test_not_xml_at_all() {
        assert!(parse_bibl_structs("Internal Server Error").is_empty());
        assert!(parse_bibl_structs("").is_empty());
    }
}
