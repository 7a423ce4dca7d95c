//! Document Locator: finds the résumé and `job.txt` in the input directory.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::document::resume_extensions;
use crate::errors::TailorError;

pub const JOB_POSTING_FILE: &str = "job.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFiles {
    pub resume: PathBuf,
    pub job_posting: PathBuf,
}

/// Editor artifacts and hidden files (`~$cv.docx`, `.~lock.cv.odt#`, `.cv.docx`).
fn is_ignored(name: &str) -> bool {
    name.starts_with("~$") || name.starts_with('.')
}

fn is_resume(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            resume_extensions().any(|known| known == ext)
        })
        .unwrap_or(false)
}

/// Requires exactly one résumé (`.docx`, `.odt`, `.pdf`, any case) and a
/// `job.txt` directly inside `dir`.
pub fn locate_inputs(dir: &Path) -> Result<InputFiles, TailorError> {
    if !dir.is_dir() {
        return Err(TailorError::InputDiscovery(format!(
            "input directory {} does not exist",
            dir.display()
        )));
    }

    let entries = std::fs::read_dir(dir).map_err(|e| {
        TailorError::InputDiscovery(format!("cannot list {}: {e}", dir.display()))
    })?;

    let mut candidates: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            TailorError::InputDiscovery(format!("cannot list {}: {e}", dir.display()))
        })?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_ignored(&name) || !path.is_file() {
            continue;
        }
        if is_resume(&path) {
            candidates.push(path);
        }
    }
    candidates.sort();

    let resume = match candidates.len() {
        0 => {
            return Err(TailorError::InputDiscovery(format!(
                "no resume (.docx, .odt or .pdf) found in {}",
                dir.display()
            )))
        }
        1 => candidates.remove(0),
        _ => {
            let names: Vec<String> = candidates
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect();
            return Err(TailorError::InputDiscovery(format!(
                "expected exactly one resume in {}, found {}: {}",
                dir.display(),
                names.len(),
                names.join(", ")
            )));
        }
    };

    let job_posting = dir.join(JOB_POSTING_FILE);
    if !job_posting.is_file() {
        return Err(TailorError::InputDiscovery(format!(
            "{JOB_POSTING_FILE} not found in {}",
            dir.display()
        )));
    }

    info!(
        "Located resume {} and job posting {}",
        resume.display(),
        job_posting.display()
    );
    Ok(InputFiles {
        resume,
        job_posting,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn dir_with(files: &[&str]) -> TempDir {
        let dir = TempDir::new().expect("create temp dir");
        for name in files {
            fs::write(dir.path().join(name), b"x").expect("write file");
        }
        dir
    }

    fn discovery_message(err: TailorError) -> String {
        match err {
            TailorError::InputDiscovery(msg) => msg,
            other => panic!("expected InputDiscovery, got {other:?}"),
        }
    }

    #[test]
    fn test_locates_single_resume_and_job() {
        let dir = dir_with(&["Jane_Doe.docx", "job.txt", "notes.md"]);
        let found = locate_inputs(dir.path()).unwrap();
        assert_eq!(found.resume, dir.path().join("Jane_Doe.docx"));
        assert_eq!(found.job_posting, dir.path().join("job.txt"));
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let dir = dir_with(&["CV.PDF", "job.txt"]);
        let found = locate_inputs(dir.path()).unwrap();
        assert_eq!(found.resume, dir.path().join("CV.PDF"));
    }

    #[test]
    fn test_lock_and_hidden_files_ignored() {
        let dir = dir_with(&["cv.odt", "~$cv.docx", ".~lock.cv.odt#", ".old.pdf", "job.txt"]);
        let found = locate_inputs(dir.path()).unwrap();
        assert_eq!(found.resume, dir.path().join("cv.odt"));
    }

    #[test]
    fn test_no_resume() {
        let dir = dir_with(&["job.txt", "cv.rtf"]);
        let msg = discovery_message(locate_inputs(dir.path()).unwrap_err());
        assert!(msg.contains("no resume"));
    }

    #[test]
    fn test_multiple_resumes_listed_sorted() {
        let dir = dir_with(&["b.pdf", "a.docx", "job.txt"]);
        let msg = discovery_message(locate_inputs(dir.path()).unwrap_err());
        assert!(msg.contains("found 2: a.docx, b.pdf"), "{msg}");
    }

    #[test]
    fn test_missing_job_posting() {
        let dir = dir_with(&["cv.docx"]);
        let msg = discovery_message(locate_inputs(dir.path()).unwrap_err());
        assert!(msg.contains("job.txt"));
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let msg = discovery_message(locate_inputs(&missing).unwrap_err());
        assert!(msg.contains("does not exist"));
    }

    #[test]
    fn test_directory_named_like_resume_ignored() {
        let dir = dir_with(&["job.txt", "cv.pdf"]);
        fs::create_dir(dir.path().join("archive.docx")).unwrap();
        let found = locate_inputs(dir.path()).unwrap();
        assert_eq!(found.resume, dir.path().join("cv.pdf"));
    }
}
