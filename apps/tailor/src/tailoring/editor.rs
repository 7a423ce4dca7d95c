//! Document Editor: applies replacements to paragraph runs.
//!
//! Only run text changes. A fragment that spans several runs is rewritten
//! into the first of them (which keeps its formatting); runs strictly inside
//! the span are emptied and the last one keeps only its tail. Paragraph
//! count and every untouched run stay exactly as read.

use std::ops::Range;

use tracing::{debug, warn};

use crate::document::{Paragraph, ResumeDocument};
use crate::tailoring::edit_plan::{
    MismatchReason, Replacement, ReplacementMismatch, ValidatedPlan,
};
use crate::tailoring::matching::find_fragment;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedReplacement {
    pub index: usize,
    pub occurrences: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditReport {
    pub applied: Vec<AppliedReplacement>,
    pub skipped: Vec<ReplacementMismatch>,
}

impl EditReport {
    pub fn total_occurrences(&self) -> usize {
        self.applied.iter().map(|a| a.occurrences).sum()
    }
}

/// Applies a validated plan. Mismatches found during validation are carried
/// into the report alongside any found while editing.
pub fn apply_edit_plan(document: &mut ResumeDocument, plan: &ValidatedPlan) -> EditReport {
    let mut report = apply_replacements(document, &plan.replacements);
    report.skipped.extend(plan.skipped.iter().cloned());
    report.skipped.sort_by_key(|m| m.index);
    report
}

/// Applies each replacement in order to every paragraph in document order.
/// Later replacements see the text produced by earlier ones.
pub fn apply_replacements(
    document: &mut ResumeDocument,
    replacements: &[(usize, Replacement)],
) -> EditReport {
    let mut report = EditReport::default();

    for (index, replacement) in replacements {
        let original = replacement.original_fragment.as_str();
        let reason = if original.trim().is_empty() {
            Some(MismatchReason::EmptyFragment)
        } else if original == replacement.new_fragment {
            Some(MismatchReason::Unchanged)
        } else {
            None
        };

        let occurrences = match reason {
            Some(_) => 0,
            None => document
                .paragraphs_mut()
                .iter_mut()
                .map(|p| replace_in_paragraph(p, original, &replacement.new_fragment))
                .sum(),
        };

        if occurrences > 0 {
            debug!("Replacement #{} applied {occurrences} time(s)", index + 1);
            report.applied.push(AppliedReplacement {
                index: *index,
                occurrences,
            });
        } else {
            let mismatch = ReplacementMismatch {
                index: *index,
                original_fragment: original.to_string(),
                reason: reason.unwrap_or(MismatchReason::NotFound),
            };
            warn!("Skipping {mismatch}");
            report.skipped.push(mismatch);
        }
    }

    report
}

/// Replaces every non-overlapping occurrence in one paragraph. Scanning
/// resumes after the inserted text.
fn replace_in_paragraph(paragraph: &mut Paragraph, original: &str, new: &str) -> usize {
    let mut count = 0;
    let mut cursor = 0;
    loop {
        let text = paragraph.text();
        let Some(range) = find_fragment(&text, original, cursor) else {
            break;
        };
        if range.is_empty() {
            break;
        }
        cursor = range.start + new.len();
        splice_runs(paragraph, range, new);
        count += 1;
    }
    count
}

/// Rewrites the runs covering `range` (byte offsets into the paragraph text).
fn splice_runs(paragraph: &mut Paragraph, range: Range<usize>, new: &str) {
    let mut offset = 0;
    let mut seen_first = false;

    for run in paragraph.runs_mut() {
        let start = offset;
        let end = start + run.text().len();
        offset = end;

        if end <= range.start {
            continue;
        }
        if start >= range.end {
            break;
        }

        let text = run.text();
        let replacement = if !seen_first {
            seen_first = true;
            let head = &text[..range.start - start];
            let tail = if range.end <= end {
                &text[range.end - start..]
            } else {
                ""
            };
            format!("{head}{new}{tail}")
        } else if range.end <= end {
            text[range.end - start..].to_string()
        } else {
            String::new()
        };

        if replacement != run.text() {
            run.set_text(replacement);
        }
    }
}
