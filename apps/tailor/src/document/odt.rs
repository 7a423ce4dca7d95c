//! ODT backend.
//!
//! Paragraphs are `text:p` and `text:h` elements of `content.xml`. Every raw
//! text node inside a paragraph is its own run, so text split by `text:span`
//! formatting shows up as separate runs exactly like DOCX `w:r` runs.
//! Spacing elements (`text:s`, `text:tab`, `text:line-break`) become
//! whitespace runs. Comments and drawing titles/descriptions are not résumé
//! text and are skipped.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::document::package::{event_span, AnchorKind, PackageError, RunAnchor, XmlPackage};
use crate::document::{read_bytes, DocumentFormat, Paragraph, ResumeDocument, Run, TextExtractor};
use crate::errors::TailorError;

const CONTENT_PART: &str = "content.xml";

pub struct OdtExtractor;

impl TextExtractor for OdtExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Odt
    }

    fn load(&self, path: &Path) -> Result<ResumeDocument, TailorError> {
        let bytes = read_bytes(path)?;
        let package = XmlPackage::open(bytes, CONTENT_PART, |name| {
            (name == CONTENT_PART).then_some(0)
        })
        .map_err(|e| TailorError::read(path, e))?;

        let mut paragraphs = Vec::new();
        for (index, part) in package.parts().iter().enumerate() {
            parse_odf_part(&part.xml, index, &mut paragraphs)
                .map_err(|e| TailorError::read(path, format!("{}: {e}", part.name)))?;
        }
        debug!("Parsed ODT {}: {} paragraphs", path.display(), paragraphs.len());

        Ok(ResumeDocument::new(
            path,
            DocumentFormat::Odt,
            paragraphs,
            Some(package),
        ))
    }
}

fn is_paragraph(name: &[u8]) -> bool {
    matches!(name, b"text:p" | b"text:h")
}

fn is_skipped(name: &[u8]) -> bool {
    matches!(
        name,
        b"office:annotation" | b"office:annotation-end" | b"svg:title" | b"svg:desc"
    )
}

/// Number of spaces a `text:s` element stands for.
fn space_count(element: &BytesStart<'_>) -> usize {
    element
        .attributes()
        .flatten()
        .find(|a| a.key.as_ref() == b"text:c")
        .and_then(|a| String::from_utf8_lossy(&a.value).trim().parse().ok())
        .unwrap_or(1)
}

pub(crate) fn parse_odf_part(
    xml: &str,
    part: usize,
    paragraphs: &mut Vec<Paragraph>,
) -> Result<(), PackageError> {
    let mut reader = Reader::from_str(xml);
    let mut open: Vec<usize> = Vec::new();
    let mut skip_depth = 0usize;

    let anchor = |span: std::ops::Range<usize>| RunAnchor {
        part,
        span,
        kind: AnchorKind::OdfText,
    };

    loop {
        let before = reader.buffer_position();
        let event = reader.read_event()?;
        let span = event_span(xml, before, reader.buffer_position());

        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(e) => {
                let name = e.name();
                if is_skipped(name.as_ref()) {
                    skip_depth = 1;
                } else if is_paragraph(name.as_ref()) {
                    paragraphs.push(Paragraph::default());
                    open.push(paragraphs.len() - 1);
                }
            }
            Event::Empty(e) => {
                let text = match e.name().as_ref() {
                    b"text:p" | b"text:h" => {
                        paragraphs.push(Paragraph::default());
                        None
                    }
                    b"text:s" => Some(" ".repeat(space_count(&e))),
                    b"text:tab" => Some("\t".to_string()),
                    b"text:line-break" => Some("\n".to_string()),
                    _ => None,
                };
                if let (Some(text), Some(&current)) = (text, open.last()) {
                    paragraphs[current].push(Run::anchored(text, anchor(span.clone())));
                }
            }
            Event::Text(t) => {
                if let Some(&current) = open.last() {
                    let text = t.unescape()?;
                    if !text.is_empty() {
                        paragraphs[current].push(Run::anchored(text, anchor(span.clone())));
                    }
                }
            }
            Event::End(e) => {
                if is_paragraph(e.name().as_ref()) {
                    open.pop();
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
const MANIFEST: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<manifest:manifest xmlns:manifest=\"urn:oasis:names:tc:opendocument:xmlns:manifest:1.0\" manifest:version=\"1.2\">\
<manifest:file-entry manifest:full-path=\"/\" manifest:media-type=\"application/vnd.oasis.opendocument.text\"/>\
<manifest:file-entry manifest:full-path=\"content.xml\" manifest:media-type=\"text/xml\"/>\
</manifest:manifest>";

#[cfg(test)]
fn content_xml(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <office:document-content \
         xmlns:office=\"urn:oasis:names:tc:opendocument:xmlns:office:1.0\" \
         xmlns:text=\"urn:oasis:names:tc:opendocument:xmlns:text:1.0\" \
         xmlns:svg=\"urn:oasis:names:tc:opendocument:xmlns:svg-compatible:1.0\" \
         xmlns:dc=\"http://purl.org/dc/elements/1.1/\" office:version=\"1.2\">\
         <office:body><office:text>{body}</office:text></office:body>\
         </office:document-content>"
    )
}

/// Minimal ODT package; `mimetype` is stored uncompressed as the first entry.
#[cfg(test)]
pub(crate) fn odf_package(body: &str) -> Result<Vec<u8>, PackageError> {
    let content = content_xml(body);
    crate::document::package::build_archive(&[
        ("mimetype", "application/vnd.oasis.opendocument.text", false),
        ("META-INF/manifest.xml", MANIFEST, true),
        (CONTENT_PART, &content, true),
    ])
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read, Write};

    use tempfile::{Builder, NamedTempFile};
    use zip::{CompressionMethod, ZipArchive};

    use super::*;
    use crate::document::fixtures::odt_with_runs;

    fn parse(body: &str) -> (String, Vec<Paragraph>) {
        let xml = content_xml(body);
        let mut paragraphs = Vec::new();
        parse_odf_part(&xml, 0, &mut paragraphs).unwrap();
        (xml, paragraphs)
    }

    fn write_temp(bytes: &[u8]) -> NamedTempFile {
        let mut file = Builder::new()
            .suffix(".odt")
            .tempfile()
            .expect("create temp file");
        file.write_all(bytes).expect("write temp file");
        file.flush().expect("flush temp file");
        file
    }

    #[test]
    fn test_spans_split_runs() {
        let (_, paragraphs) = parse(
            "<text:p>Senior <text:span text:style-name=\"Strong\">Rust</text:span> Engineer</text:p>",
        );
        let texts: Vec<_> = paragraphs[0].runs().iter().map(Run::text).collect();
        assert_eq!(texts, vec!["Senior ", "Rust", " Engineer"]);
    }

    #[test]
    fn test_headings_and_empty_paragraphs() {
        let (_, paragraphs) =
            parse("<text:h text:outline-level=\"1\">Jane Doe</text:h><text:p/><text:p>CV</text:p>");
        let texts: Vec<_> = paragraphs.iter().map(Paragraph::text).collect();
        assert_eq!(texts, vec!["Jane Doe", "", "CV"]);
    }

    #[test]
    fn test_spacing_elements() {
        let (_, paragraphs) = parse(
            "<text:p>a<text:s text:c=\"3\"/>b<text:s/>c<text:tab/>d<text:line-break/>e</text:p>",
        );
        assert_eq!(paragraphs[0].text(), "a   b c\td\ne");
    }

    #[test]
    fn test_annotations_skipped() {
        let (_, paragraphs) = parse(
            "<text:p>Lead<office:annotation><dc:creator>Rev</dc:creator>\
             <text:p>check this</text:p></office:annotation> Engineer</text:p>",
        );
        assert_eq!(paragraphs.len(), 1);
        assert_eq!(paragraphs[0].text(), "Lead Engineer");
    }

    #[test]
    fn test_list_items_are_paragraphs() {
        let (_, paragraphs) = parse(
            "<text:list><text:list-item><text:p>Rust</text:p></text:list-item>\
             <text:list-item><text:p>Go</text:p></text:list-item></text:list>",
        );
        let texts: Vec<_> = paragraphs.iter().map(Paragraph::text).collect();
        assert_eq!(texts, vec!["Rust", "Go"]);
    }

    #[test]
    fn test_text_anchor_covers_escaped_source() {
        let (xml, paragraphs) = parse("<text:p>R&amp;D</text:p>");
        let run = &paragraphs[0].runs()[0];
        assert_eq!(run.text(), "R&D");
        assert_eq!(&xml[run.anchor().unwrap().span.clone()], "R&amp;D");
    }

    #[test]
    fn test_load_and_extract_text() {
        let file = write_temp(&odt_with_runs(&[
            &[("Jane Doe", true)],
            &[("Skills: ", false), ("Rust, Python", false)],
        ]));
        let text = OdtExtractor.extract_text(file.path()).unwrap();
        assert_eq!(text, "Jane Doe\nSkills: Rust, Python");
    }

    #[test]
    fn test_rendered_package_keeps_mimetype_first_and_stored() {
        let file = write_temp(&odt_with_runs(&[&[("Python", false)]]));
        let mut doc = OdtExtractor.load(file.path()).unwrap();
        doc.paragraphs_mut()[0].runs_mut()[0].set_text("Rust".to_string());
        let out = doc.to_bytes().unwrap();

        let mut zip = ZipArchive::new(Cursor::new(out.as_slice())).unwrap();
        {
            let first = zip.by_index(0).unwrap();
            assert_eq!(first.name(), "mimetype");
            assert_eq!(first.compression(), CompressionMethod::Stored);
        }
        let mut content = String::new();
        zip.by_name("content.xml")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert!(content.contains("<text:p text:style-name=\"P1\">Rust</text:p>"));
    }

    #[test]
    fn test_missing_content_part() {
        let archive = crate::document::package::build_archive(&[(
            "mimetype",
            "application/vnd.oasis.opendocument.text",
            false,
        )])
        .unwrap();
        let file = write_temp(&archive);
        let err = OdtExtractor.load(file.path()).unwrap_err();
        assert!(matches!(err, TailorError::Read { .. }));
    }
}
