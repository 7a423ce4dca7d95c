//! Zip-packaged XML documents (OOXML, ODF).
//!
//! A package is kept as its original archive bytes plus the decoded XML parts
//! that carry text. Rendering splices new text into those parts at the byte
//! spans recorded while parsing and copies every other entry raw, so styles,
//! media and untouched markup come out byte-for-byte identical.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::ops::Range;

use quick_xml::escape::escape;
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::document::Run;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("missing package part '{0}'")]
    MissingPart(String),
}

/// How a run's text is written back into its part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    /// WordprocessingML: the span covers a whole `w:t`, `w:tab` or `w:br` element.
    WordText,
    /// ODF: the span covers a raw text node or a `text:s`/`text:tab`/`text:line-break` element.
    OdfText,
}

/// Where a run lives inside the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunAnchor {
    pub part: usize,
    pub span: Range<usize>,
    pub kind: AnchorKind,
}

#[derive(Debug, Clone)]
pub struct XmlPart {
    pub name: String,
    pub xml: String,
}

#[derive(Debug, Clone)]
pub struct XmlPackage {
    archive: Vec<u8>,
    parts: Vec<XmlPart>,
}

impl XmlPackage {
    /// Opens an archive and decodes the parts accepted by `rank`, ordered by
    /// rank then name. `required` must be among them.
    pub fn open<F>(archive: Vec<u8>, required: &str, rank: F) -> Result<Self, PackageError>
    where
        F: Fn(&str) -> Option<u8>,
    {
        let mut zip = ZipArchive::new(Cursor::new(archive.as_slice()))?;

        let mut selected: Vec<(u8, String)> = zip
            .file_names()
            .filter_map(|name| rank(name).map(|r| (r, name.to_string())))
            .collect();
        selected.sort();

        if !selected.iter().any(|(_, name)| name == required) {
            return Err(PackageError::MissingPart(required.to_string()));
        }

        let mut parts = Vec::with_capacity(selected.len());
        for (_, name) in selected {
            let mut xml = String::new();
            zip.by_name(&name)?.read_to_string(&mut xml)?;
            parts.push(XmlPart { name, xml });
        }
        drop(zip);

        Ok(Self { archive, parts })
    }

    pub fn parts(&self) -> &[XmlPart] {
        &self.parts
    }

    /// Re-emits the archive with the text of every modified run spliced in.
    pub fn render<'a, I>(&self, runs: I) -> Result<Vec<u8>, PackageError>
    where
        I: IntoIterator<Item = &'a Run>,
    {
        let mut edits: Vec<Vec<(Range<usize>, String)>> = vec![Vec::new(); self.parts.len()];
        for run in runs {
            if !run.is_modified() {
                continue;
            }
            if let Some(anchor) = run.anchor() {
                let markup = match anchor.kind {
                    AnchorKind::WordText => word_text_markup(run.text()),
                    AnchorKind::OdfText => odf_text_markup(run.text()),
                };
                edits[anchor.part].push((anchor.span.clone(), markup));
            }
        }

        let mut replaced: HashMap<&str, String> = HashMap::new();
        for (part, mut part_edits) in self.parts.iter().zip(edits) {
            if part_edits.is_empty() {
                continue;
            }
            part_edits.sort_by_key(|(span, _)| span.start);
            replaced.insert(part.name.as_str(), splice(&part.xml, &part_edits));
        }

        rewrite_archive(&self.archive, &replaced)
    }
}

/// Byte span in `xml` of the event read between `before` and `after`.
/// The reader consumes the `<` that terminates a text node as part of the
/// text event, so a text span may end one byte late and the next tag span
/// start one byte late.
pub fn event_span(xml: &str, before: usize, after: usize) -> Range<usize> {
    let bytes = xml.as_bytes();
    let mut start = before;
    if bytes.get(start) != Some(&b'<') && start > 0 && bytes.get(start - 1) == Some(&b'<') {
        start -= 1;
    }
    let mut end = after.min(bytes.len());
    if end > start && bytes[end - 1] == b'<' {
        end -= 1;
    }
    start..end
}

fn splice(xml: &str, edits: &[(Range<usize>, String)]) -> String {
    let mut out = String::with_capacity(xml.len() + 64 * edits.len());
    let mut cursor = 0;
    for (span, markup) in edits {
        out.push_str(&xml[cursor..span.start]);
        out.push_str(markup);
        cursor = span.end;
    }
    out.push_str(&xml[cursor..]);
    out
}

/// Copies `source` entry by entry, swapping in the replaced parts.
/// Untouched entries are copied raw (same compression, same bytes, same order).
pub fn rewrite_archive(
    source: &[u8],
    replaced: &HashMap<&str, String>,
) -> Result<Vec<u8>, PackageError> {
    let mut zip = ZipArchive::new(Cursor::new(source))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(source.len())));

    for index in 0..zip.len() {
        let entry = zip.by_index_raw(index)?;
        match replaced.get(entry.name()) {
            Some(xml) => {
                let name = entry.name().to_string();
                drop(entry);
                writer.start_file(name, deflated())?;
                writer.write_all(xml.as_bytes())?;
            }
            None => writer.raw_copy_file(entry)?,
        }
    }

    Ok(writer.finish()?.into_inner())
}

/// Builds a fresh archive from `(name, content, compress)` entries, in order.
pub fn build_archive(entries: &[(&str, &str, bool)]) -> Result<Vec<u8>, PackageError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content, compress) in entries {
        let options = if *compress {
            deflated()
        } else {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        };
        writer.start_file(*name, options)?;
        writer.write_all(content.as_bytes())?;
    }
    Ok(writer.finish()?.into_inner())
}

fn deflated() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// `w:t` markup for a run's text; tabs and line breaks become their own elements.
pub fn word_text_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 32);
    let mut segment = String::new();
    let flush = |out: &mut String, segment: &mut String| {
        if !segment.is_empty() {
            out.push_str("<w:t xml:space=\"preserve\">");
            out.push_str(&escape(segment.as_str()));
            out.push_str("</w:t>");
            segment.clear();
        }
    };
    for c in text.chars() {
        match c {
            '\t' => {
                flush(&mut out, &mut segment);
                out.push_str("<w:tab/>");
            }
            '\n' => {
                flush(&mut out, &mut segment);
                out.push_str("<w:br/>");
            }
            _ => segment.push(c),
        }
    }
    flush(&mut out, &mut segment);
    if out.is_empty() {
        // Keep a node in place so the run stays well-formed.
        out.push_str("<w:t xml:space=\"preserve\"></w:t>");
    }
    out
}

/// ODF text markup: spaces beyond the first in a sequence become `text:s`.
pub fn odf_text_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\t' => out.push_str("<text:tab/>"),
            '\n' => out.push_str("<text:line-break/>"),
            ' ' => {
                out.push(' ');
                let mut extra = 0;
                while chars.peek() == Some(&' ') {
                    chars.next();
                    extra += 1;
                }
                if extra > 0 {
                    out.push_str(&format!("<text:s text:c=\"{extra}\"/>"));
                }
            }
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
