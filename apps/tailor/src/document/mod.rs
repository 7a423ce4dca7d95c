// Document layer: locating the résumé, reading it into paragraphs of runs,
// and writing an edited copy back in its own format.

pub mod docx;
pub mod locator;
pub mod odt;
pub mod package;
pub mod pdf;

use std::path::{Path, PathBuf};

use crate::errors::TailorError;
use crate::output::write_atomic;

pub use docx::DocxExtractor;
pub use locator::{locate_inputs, InputFiles};
pub use odt::OdtExtractor;
pub use package::{RunAnchor, XmlPackage};
pub use pdf::PdfExtractor;

/// Résumé formats the reader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Docx,
    Odt,
    Pdf,
}

impl DocumentFormat {
    /// Extension of the edited copy. PDFs cannot be edited in place and are
    /// re-emitted as DOCX.
    pub fn output_extension(self) -> &'static str {
        match self {
            DocumentFormat::Docx | DocumentFormat::Pdf => "docx",
            DocumentFormat::Odt => "odt",
        }
    }
}

/// A contiguous span of uniformly formatted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    text: String,
    original: String,
    anchor: Option<RunAnchor>,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            original: text.clone(),
            text,
            anchor: None,
        }
    }

    pub fn anchored(text: impl Into<String>, anchor: RunAnchor) -> Self {
        Self {
            anchor: Some(anchor),
            ..Self::new(text)
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: String) {
        self.text = text;
    }

    pub fn is_modified(&self) -> bool {
        self.text != self.original
    }

    pub fn anchor(&self) -> Option<&RunAnchor> {
        self.anchor.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    runs: Vec<Run>,
}

impl Paragraph {
    pub fn new(runs: Vec<Run>) -> Self {
        Self { runs }
    }

    pub fn push(&mut self, run: Run) {
        self.runs.push(run);
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn runs_mut(&mut self) -> &mut [Run] {
        &mut self.runs
    }

    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(Run::text).collect()
    }
}

/// In-memory résumé: ordered paragraphs plus, for editable formats, the
/// source package the runs point into.
#[derive(Debug, Clone)]
pub struct ResumeDocument {
    path: PathBuf,
    format: DocumentFormat,
    paragraphs: Vec<Paragraph>,
    package: Option<XmlPackage>,
}

impl ResumeDocument {
    pub fn new(
        path: impl Into<PathBuf>,
        format: DocumentFormat,
        paragraphs: Vec<Paragraph>,
        package: Option<XmlPackage>,
    ) -> Self {
        Self {
            path: path.into(),
            format,
            paragraphs,
            package,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// File name without extension, used to name the edited copy.
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "resume".to_string())
    }

    pub fn paragraphs(&self) -> &[Paragraph] {
        &self.paragraphs
    }

    pub fn paragraphs_mut(&mut self) -> &mut [Paragraph] {
        &mut self.paragraphs
    }

    /// Non-blank paragraph texts joined by newlines.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Serializes the document, edits included.
    pub fn to_bytes(&self) -> Result<Vec<u8>, package::PackageError> {
        match &self.package {
            Some(package) => package.render(self.paragraphs.iter().flat_map(|p| p.runs())),
            None => {
                let lines: Vec<String> = self.paragraphs.iter().map(Paragraph::text).collect();
                docx::render_plain_docx(&lines)
            }
        }
    }

    /// Writes the document to `dest`. The source file is never touched.
    pub fn save(&self, dest: &Path) -> Result<(), TailorError> {
        let bytes = self.to_bytes().map_err(|e| TailorError::write(dest, e))?;
        write_atomic(dest, &bytes)
    }
}

/// Capability to turn a file of one format into a `ResumeDocument`.
pub trait TextExtractor: Send + Sync {
    fn format(&self) -> DocumentFormat;

    fn load(&self, path: &Path) -> Result<ResumeDocument, TailorError>;

    fn extract_text(&self, path: &Path) -> Result<String, TailorError> {
        Ok(self.load(path)?.plain_text())
    }
}

/// Extension → extractor lookup. Extensions are matched lower-cased.
static EXTRACTORS: [(&str, &dyn TextExtractor); 3] = [
    ("docx", &DocxExtractor),
    ("odt", &OdtExtractor),
    ("pdf", &PdfExtractor),
];

/// Extensions accepted as résumé files.
pub fn resume_extensions() -> impl Iterator<Item = &'static str> {
    EXTRACTORS.iter().map(|(ext, _)| *ext)
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase()
}

pub fn extractor_for(path: &Path) -> Result<&'static dyn TextExtractor, TailorError> {
    let extension = extension_of(path);
    EXTRACTORS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, extractor)| *extractor)
        .ok_or_else(|| TailorError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension,
        })
}

/// Loads a résumé using the extractor registered for its extension.
pub fn load_document(path: &Path) -> Result<ResumeDocument, TailorError> {
    extractor_for(path)?.load(path)
}

/// Reads the job posting as UTF-8 text.
pub fn read_job_posting(path: &Path) -> Result<String, TailorError> {
    std::fs::read_to_string(path).map_err(|e| TailorError::read(path, e))
}

pub(crate) fn read_bytes(path: &Path) -> Result<Vec<u8>, TailorError> {
    std::fs::read(path).map_err(|e| TailorError::read(path, e))
}
