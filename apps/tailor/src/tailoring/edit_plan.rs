//! Response Validator: turns the model's raw text into a checked edit plan.
//!
//! Structural problems (not JSON, missing or mistyped fields, blank company
//! or cover letter) are fatal `ResponseFormat` errors. Problems with single
//! replacements are not: they become `ReplacementMismatch` records and the
//! rest of the plan still applies.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::ResumeDocument;
use crate::errors::TailorError;
use crate::llm_client::strip_json_fences;
use crate::tailoring::matching::contains_fragment;

/// The structured response the model is asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditPlan {
    pub company_name: String,
    pub cover_letter: String,
    pub replacements: Vec<Replacement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    #[serde(alias = "from")]
    pub original_fragment: String,
    #[serde(alias = "to")]
    pub new_fragment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchReason {
    NotFound,
    EmptyFragment,
    Unchanged,
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            MismatchReason::NotFound => "fragment not found in any paragraph",
            MismatchReason::EmptyFragment => "original fragment is empty",
            MismatchReason::Unchanged => "new fragment is identical to the original",
        };
        f.write_str(text)
    }
}

/// A replacement that was skipped. Recoverable; reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementMismatch {
    /// Position in the model's `replacements` array.
    pub index: usize,
    pub original_fragment: String,
    pub reason: MismatchReason,
}

impl fmt::Display for ReplacementMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "replacement #{} ({:?}): {}",
            self.index + 1,
            self.original_fragment,
            self.reason
        )
    }
}

/// An edit plan whose replacements have each been located in the document.
#[derive(Debug, Clone)]
pub struct ValidatedPlan {
    pub company_name: String,
    pub cover_letter: String,
    /// Applicable replacements, tagged with their position in the response.
    pub replacements: Vec<(usize, Replacement)>,
    pub skipped: Vec<ReplacementMismatch>,
}

/// Slice from the first `{` to the last `}` after removing code fences.
fn json_object(raw: &str) -> Result<&str, TailorError> {
    let text = strip_json_fences(raw);
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(&text[start..=end]),
        _ => Err(TailorError::ResponseFormat(
            "response does not contain a JSON object".to_string(),
        )),
    }
}

/// Strict parse of the model's raw text into an `EditPlan`.
pub fn parse_edit_plan(raw: &str) -> Result<EditPlan, TailorError> {
    let json = json_object(raw)?;
    let plan: EditPlan =
        serde_json::from_str(json).map_err(|e| TailorError::ResponseFormat(e.to_string()))?;

    if plan.company_name.trim().is_empty() {
        return Err(TailorError::ResponseFormat(
            "'company_name' is empty".to_string(),
        ));
    }
    if plan.cover_letter.trim().is_empty() {
        return Err(TailorError::ResponseFormat(
            "'cover_letter' is empty".to_string(),
        ));
    }

    debug!(
        "Parsed edit plan: company={:?}, {} replacements, cover letter {} chars",
        plan.company_name,
        plan.replacements.len(),
        plan.cover_letter.len()
    );
    Ok(plan)
}

/// Why `replacement` cannot be applied to a document with these paragraph texts.
fn check_replacement(replacement: &Replacement, paragraphs: &[String]) -> Option<MismatchReason> {
    if replacement.original_fragment.trim().is_empty() {
        return Some(MismatchReason::EmptyFragment);
    }
    if replacement.original_fragment == replacement.new_fragment {
        return Some(MismatchReason::Unchanged);
    }
    let found = paragraphs
        .iter()
        .any(|text| contains_fragment(text, &replacement.original_fragment));
    (!found).then_some(MismatchReason::NotFound)
}

/// Parses the response and checks every replacement against `document`.
pub fn validate_edit_plan(
    raw: &str,
    document: &ResumeDocument,
) -> Result<ValidatedPlan, TailorError> {
    let plan = parse_edit_plan(raw)?;
    let paragraphs: Vec<String> = document.paragraphs().iter().map(|p| p.text()).collect();

    let mut replacements = Vec::with_capacity(plan.replacements.len());
    let mut skipped = Vec::new();
    for (index, replacement) in plan.replacements.into_iter().enumerate() {
        match check_replacement(&replacement, &paragraphs) {
            None => replacements.push((index, replacement)),
            Some(reason) => {
                let mismatch = ReplacementMismatch {
                    index,
                    original_fragment: replacement.original_fragment,
                    reason,
                };
                warn!("Skipping {mismatch}");
                skipped.push(mismatch);
            }
        }
    }

    Ok(ValidatedPlan {
        company_name: plan.company_name,
        cover_letter: plan.cover_letter,
        replacements,
        skipped,
    })
}
