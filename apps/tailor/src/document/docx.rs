//! DOCX backend: WordprocessingML paragraphs and runs.
//!
//! Reads `word/document.xml` plus every header and footer part. Each `w:t`
//! element inside a `w:r` becomes one `Run`; `w:tab`, `w:br` and `w:cr`
//! inside a run become `\t`/`\n` runs so paragraph text reads naturally and
//! a fragment spanning a tab can still be located. Content under
//! `mc:Fallback` duplicates the `mc:Choice` branch and is skipped.

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::debug;

use crate::document::package::{
    build_archive, event_span, word_text_markup, AnchorKind, PackageError, RunAnchor, XmlPackage,
};
use crate::document::{read_bytes, DocumentFormat, Paragraph, ResumeDocument, Run, TextExtractor};
use crate::errors::TailorError;

const MAIN_PART: &str = "word/document.xml";

pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn load(&self, path: &Path) -> Result<ResumeDocument, TailorError> {
        let bytes = read_bytes(path)?;
        let package =
            XmlPackage::open(bytes, MAIN_PART, part_rank).map_err(|e| TailorError::read(path, e))?;

        let mut paragraphs = Vec::new();
        for (index, part) in package.parts().iter().enumerate() {
            parse_word_part(&part.xml, index, &mut paragraphs)
                .map_err(|e| TailorError::read(path, format!("{}: {e}", part.name)))?;
        }
        debug!(
            "Parsed DOCX {}: {} parts, {} paragraphs",
            path.display(),
            package.parts().len(),
            paragraphs.len()
        );

        Ok(ResumeDocument::new(
            path,
            DocumentFormat::Docx,
            paragraphs,
            Some(package),
        ))
    }
}

/// Body first, then headers, then footers.
fn part_rank(name: &str) -> Option<u8> {
    if name == MAIN_PART {
        return Some(0);
    }
    let file = name.strip_prefix("word/")?;
    if file.contains('/') || !file.ends_with(".xml") {
        return None;
    }
    if file.starts_with("header") {
        Some(1)
    } else if file.starts_with("footer") {
        Some(2)
    } else {
        None
    }
}

/// Text collected between `<w:t>` and `</w:t>`.
struct PendingText {
    start: usize,
    text: String,
}

/// Walks one WordprocessingML part, appending its paragraphs in order.
pub(crate) fn parse_word_part(
    xml: &str,
    part: usize,
    paragraphs: &mut Vec<Paragraph>,
) -> Result<(), PackageError> {
    let mut reader = Reader::from_str(xml);
    let mut open: Vec<usize> = Vec::new();
    let mut run_depth = 0usize;
    let mut fallback_depth = 0usize;
    let mut pending: Option<PendingText> = None;

    let anchor = |span: std::ops::Range<usize>| RunAnchor {
        part,
        span,
        kind: AnchorKind::WordText,
    };

    loop {
        let before = reader.buffer_position();
        let event = reader.read_event()?;
        let span = event_span(xml, before, reader.buffer_position());

        if fallback_depth > 0 {
            match event {
                Event::Start(e) if e.name().as_ref() == b"mc:Fallback" => fallback_depth += 1,
                Event::End(e) if e.name().as_ref() == b"mc:Fallback" => fallback_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => {
                    paragraphs.push(Paragraph::default());
                    open.push(paragraphs.len() - 1);
                }
                b"w:r" => run_depth += 1,
                b"w:t" if run_depth > 0 => {
                    pending = Some(PendingText {
                        start: span.start,
                        text: String::new(),
                    });
                }
                b"mc:Fallback" => fallback_depth = 1,
                _ => {}
            },
            Event::Empty(e) => {
                let text = match e.name().as_ref() {
                    b"w:p" => {
                        paragraphs.push(Paragraph::default());
                        None
                    }
                    b"w:t" if run_depth > 0 => Some(""),
                    b"w:tab" if run_depth > 0 => Some("\t"),
                    b"w:br" | b"w:cr" if run_depth > 0 => Some("\n"),
                    _ => None,
                };
                if let (Some(text), Some(&current)) = (text, open.last()) {
                    paragraphs[current].push(Run::anchored(text, anchor(span.clone())));
                }
            }
            Event::Text(t) => {
                if let Some(pending) = pending.as_mut() {
                    pending.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(t) => {
                if let Some(pending) = pending.as_mut() {
                    pending.text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => {
                    if let (Some(done), Some(&current)) = (pending.take(), open.last()) {
                        paragraphs[current].push(Run::anchored(done.text, anchor(done.start..span.end)));
                    }
                }
                b"w:r" => run_depth = run_depth.saturating_sub(1),
                b"w:p" => {
                    open.pop();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

/// `word/document.xml` wrapper around a body fragment.
fn document_xml(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}<w:sectPr/></w:body></w:document>"
    )
}

const CONTENT_TYPES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/word/document.xml\" \
ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
</Types>";

const ROOT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" \
Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" \
Target=\"word/document.xml\"/>\
</Relationships>";

/// Minimal DOCX package around a `w:body` fragment.
pub(crate) fn word_package(body: &str) -> Result<Vec<u8>, PackageError> {
    let document = document_xml(body);
    build_archive(&[
        ("[Content_Types].xml", CONTENT_TYPES, true),
        ("_rels/.rels", ROOT_RELS, true),
        (MAIN_PART, &document, true),
    ])
}

/// DOCX with one single-run paragraph per line. Used for résumés that have
/// no editable source (PDF).
pub fn render_plain_docx(lines: &[String]) -> Result<Vec<u8>, PackageError> {
    let mut body = String::new();
    for line in lines {
        body.push_str("<w:p>");
        if !line.is_empty() {
            body.push_str("<w:r>");
            body.push_str(&word_text_markup(line));
            body.push_str("</w:r>");
        }
        body.push_str("</w:p>");
    }
    word_package(&body)
}
