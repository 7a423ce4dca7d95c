//! Output bundle: `<output_dir>/<company>/` holding the cover letter and the
//! tailored résumé. Every file is written through a temp file in the target
//! directory and renamed into place.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::OutputPolicy;
use crate::errors::TailorError;

pub const COVER_LETTER_FILE: &str = "cover_letter.txt";
const FALLBACK_COMPANY: &str = "customized";
const PDF_EXPORT_TIMEOUT: Duration = Duration::from_secs(120);

/// Makes a company name safe as a single path component.
pub fn sanitize_company_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = replaced.trim_matches(|c| c == ' ' || c == '.');

    let mut collapsed = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        if c == '_' && collapsed.ends_with('_') {
            continue;
        }
        collapsed.push(c);
    }

    if collapsed.is_empty() || collapsed.eq_ignore_ascii_case("unknown") {
        FALLBACK_COMPANY.to_string()
    } else {
        collapsed
    }
}

/// Writes `bytes` to `path` atomically: temp file in the same directory,
/// then rename. A failure leaves no file at `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), TailorError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| TailorError::write(path, e))?;
    tmp.write_all(bytes).map_err(|e| TailorError::write(path, e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| TailorError::write(path, e))?;
    tmp.persist(path)
        .map_err(|e| TailorError::write(path, e.error))?;
    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// The per-company output directory of one run.
#[derive(Debug, Clone)]
pub struct OutputBundle {
    dir: PathBuf,
    company: String,
}

impl OutputBundle {
    /// Creates `<root>/<company>`. With `OutputPolicy::Version` an existing
    /// directory is left alone and `<company>-2`, `<company>-3`, ... is used.
    pub fn create(
        root: &Path,
        company_name: &str,
        policy: OutputPolicy,
    ) -> Result<Self, TailorError> {
        let company = sanitize_company_name(company_name);
        let mut dir = root.join(&company);

        if policy == OutputPolicy::Version {
            let mut version = 2;
            while dir.exists() {
                dir = root.join(format!("{company}-{version}"));
                version += 1;
            }
        }

        std::fs::create_dir_all(&dir).map_err(|e| TailorError::write(&dir, e))?;
        info!("Output directory ready: {}", dir.display());
        Ok(Self { dir, company })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn write_cover_letter(&self, text: &str) -> Result<PathBuf, TailorError> {
        let path = self.dir.join(COVER_LETTER_FILE);
        let mut body = text.trim_end().to_string();
        body.push('\n');
        write_atomic(&path, body.as_bytes())?;
        Ok(path)
    }

    /// `<stem>_CV_<company>.<extension>` inside the bundle directory.
    pub fn document_path(&self, stem: &str, extension: &str) -> PathBuf {
        self.dir
            .join(format!("{stem}_CV_{}.{extension}", self.company))
    }
}

/// Converts `document` to PDF next to it with a headless LibreOffice.
pub async fn export_pdf(document: &Path) -> Result<PathBuf, TailorError> {
    let outdir = document.parent().unwrap_or_else(|| Path::new("."));
    let mut last_error = String::from("no LibreOffice binary found");

    for binary in ["soffice", "libreoffice"] {
        let run = Command::new(binary)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(outdir)
            .arg(document)
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(PDF_EXPORT_TIMEOUT, run).await {
            Err(_) => {
                return Err(TailorError::write(
                    document,
                    format!("{binary} timed out after {}s", PDF_EXPORT_TIMEOUT.as_secs()),
                ))
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Ok(Err(e)) => {
                last_error = format!("{binary}: {e}");
                continue;
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TailorError::write(
                document,
                format!("{binary} conversion failed: {}", stderr.trim()),
            ));
        }

        let pdf = document.with_extension("pdf");
        if !pdf.exists() {
            return Err(TailorError::write(
                &pdf,
                format!("{binary} reported success but produced no PDF"),
            ));
        }
        return Ok(pdf);
    }

    Err(TailorError::write(document, last_error))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_sanitize_company_name() {
        assert_eq!(sanitize_company_name("Acme"), "Acme");
        assert_eq!(sanitize_company_name("Acme: Cloud/Infra?"), "Acme_ Cloud_Infra_");
        assert_eq!(sanitize_company_name(" .Acme Corp. "), "Acme Corp");
        assert_eq!(sanitize_company_name("A<>B"), "A_B");
        assert_eq!(sanitize_company_name("Ünïcode GmbH"), "Ünïcode GmbH");
    }

    #[test]
    fn test_sanitize_fallbacks() {
        assert_eq!(sanitize_company_name(""), "customized");
        assert_eq!(sanitize_company_name(" .. "), "customized");
        assert_eq!(sanitize_company_name("unknown"), "customized");
        assert_eq!(sanitize_company_name("Unknown"), "customized");
    }

    #[test]
    fn test_sanitized_name_is_single_component() {
        let name = sanitize_company_name("../../etc/passwd");
        assert!(!name.contains('/'));
        assert_eq!(Path::new(&name).components().count(), 1);
    }

    #[test]
    fn test_bundle_paths() {
        let root = TempDir::new().unwrap();
        let bundle = OutputBundle::create(root.path(), "Acme", OutputPolicy::Version).unwrap();
        assert_eq!(bundle.dir(), root.path().join("Acme"));
        assert!(bundle.dir().is_dir());
        assert_eq!(
            bundle.document_path("Jane_Doe", "docx"),
            root.path().join("Acme").join("Jane_Doe_CV_Acme.docx")
        );
    }

    #[test]
    fn test_version_policy_never_reuses_directory() {
        let root = TempDir::new().unwrap();
        let first = OutputBundle::create(root.path(), "Acme", OutputPolicy::Version).unwrap();
        let second = OutputBundle::create(root.path(), "Acme", OutputPolicy::Version).unwrap();
        let third = OutputBundle::create(root.path(), "Acme", OutputPolicy::Version).unwrap();
        assert_eq!(first.dir(), root.path().join("Acme"));
        assert_eq!(second.dir(), root.path().join("Acme-2"));
        assert_eq!(third.dir(), root.path().join("Acme-3"));
        assert_eq!(third.company(), "Acme");
    }

    #[test]
    fn test_overwrite_policy_reuses_directory() {
        let root = TempDir::new().unwrap();
        let first = OutputBundle::create(root.path(), "Acme", OutputPolicy::Overwrite).unwrap();
        first.write_cover_letter("old").unwrap();
        let second = OutputBundle::create(root.path(), "Acme", OutputPolicy::Overwrite).unwrap();
        assert_eq!(first.dir(), second.dir());
        let path = second.write_cover_letter("new").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "new\n");
    }

    #[test]
    fn test_write_atomic_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.bin");
        write_atomic(&path, b"hello").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"hello");
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_write_atomic_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.bin");
        let err = write_atomic(&path, b"x").unwrap_err();
        assert!(matches!(err, TailorError::DocumentWrite { .. }));
        assert!(!path.exists());
    }
}
