//! PDF backend. Text only: every non-blank line becomes a one-run paragraph
//! with no anchor, and the edited copy is re-emitted as a plain DOCX.

use std::path::Path;

use tracing::debug;

use crate::document::{read_bytes, DocumentFormat, Paragraph, ResumeDocument, Run, TextExtractor};
use crate::errors::TailorError;

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn load(&self, path: &Path) -> Result<ResumeDocument, TailorError> {
        let bytes = read_bytes(path)?;

        // pdf-extract can panic on malformed input
        let extracted = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(&bytes)
        }));
        let text = match extracted {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(TailorError::read(path, format!("PDF extraction failed: {e}"))),
            Err(_) => {
                return Err(TailorError::read(
                    path,
                    "PDF extraction panicked (malformed PDF)",
                ))
            }
        };
        debug!("PDF extracted: {} chars", text.len());

        let paragraphs = paragraphs_from_text(&text);
        if paragraphs.is_empty() {
            return Err(TailorError::read(
                path,
                "PDF contains no extractable text (scanned image?)",
            ));
        }

        Ok(ResumeDocument::new(path, DocumentFormat::Pdf, paragraphs, None))
    }
}

fn paragraphs_from_text(text: &str) -> Vec<Paragraph> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Paragraph::new(vec![Run::new(line)]))
        .collect()
}
