//! Prompt Builder: renders the tailoring prompt from résumé and job-posting text.
//!
//! Pure function of its inputs: no clock, no randomness, no environment.

use crate::errors::TailorError;
use crate::llm_client::prompts::{INTEGRITY_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::tailoring::prompts::TAILOR_PROMPT_TEMPLATE;

/// Builds the tailoring prompt. Both inputs are trimmed before embedding.
pub fn build_prompt(resume_text: &str, job_text: &str) -> Result<String, TailorError> {
    let resume = resume_text.trim();
    let job = job_text.trim();

    if resume.is_empty() {
        return Err(TailorError::Precondition(
            "resume text is empty; nothing to tailor".to_string(),
        ));
    }
    if job.is_empty() {
        return Err(TailorError::Precondition(
            "job posting text is empty".to_string(),
        ));
    }

    Ok(render(
        TAILOR_PROMPT_TEMPLATE,
        &[
            ("json_only", JSON_ONLY_SYSTEM),
            ("integrity_instruction", INTEGRITY_INSTRUCTION),
            ("resume", resume),
            ("job_posting", job),
        ],
    ))
}

/// Single-pass `{key}` substitution. Substituted text is never rescanned, so a
/// résumé that happens to contain `{job_posting}` stays literal. Braces that
/// do not name a known key are copied through.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let hit = values
            .iter()
            .find(|(key, _)| tail.starts_with(key) && tail[key.len()..].starts_with('}'));
        match hit {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len() + 1..];
            }
            None => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}
