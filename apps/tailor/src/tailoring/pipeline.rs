//! Tailoring pipeline: orchestrates one run end to end.
//!
//! Flow: locate inputs → read résumé + job posting → build prompt →
//!       model call → validate edit plan → apply edits → write bundle.
//!
//! Nothing is written to the output directory until the edit plan has been
//! validated, and the input résumé is only ever read.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::Config;
use crate::document::{load_document, locate_inputs, read_job_posting};
use crate::errors::TailorError;
use crate::llm_client::TextModel;
use crate::output::{export_pdf, OutputBundle};
use crate::tailoring::edit_plan::validate_edit_plan;
use crate::tailoring::editor::{apply_edit_plan, EditReport};
use crate::tailoring::prompt_builder::build_prompt;
use crate::tailoring::prompts::TAILOR_SYSTEM;

// ────────────────────────────────────────────────────────────────────────────
// Result
// ────────────────────────────────────────────────────────────────────────────

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct TailorOutcome {
    pub company: String,
    pub output_dir: PathBuf,
    pub cover_letter_path: PathBuf,
    pub document_path: PathBuf,
    pub pdf_path: Option<PathBuf>,
    pub report: EditReport,
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

pub async fn run(config: &Config, model: &dyn TextModel) -> Result<TailorOutcome, TailorError> {
    let inputs = locate_inputs(&config.input_dir)?;

    let mut document = load_document(&inputs.resume)?;
    let resume_text = document.plain_text();
    info!(
        "Read {:?} resume {}: {} paragraphs, {} chars",
        document.format(),
        document.path().display(),
        document.paragraphs().len(),
        resume_text.len()
    );

    let job_text = read_job_posting(&inputs.job_posting)?;
    info!("Read job posting: {} chars", job_text.len());

    let prompt = build_prompt(&resume_text, &job_text)?;
    info!("Requesting edit plan from model ({} char prompt)", prompt.len());
    let raw = model.complete(&prompt, TAILOR_SYSTEM).await?;
    info!("Model responded: {} chars", raw.len());

    let plan = validate_edit_plan(&raw, &document)?;
    info!(
        "Edit plan for {:?}: {} applicable replacements, {} skipped",
        plan.company_name,
        plan.replacements.len(),
        plan.skipped.len()
    );

    let report = apply_edit_plan(&mut document, &plan);
    info!(
        "Applied {} replacements ({} occurrences)",
        report.applied.len(),
        report.total_occurrences()
    );

    let bundle =
        OutputBundle::create(&config.output_dir, &plan.company_name, config.output_policy)?;
    let cover_letter_path = bundle.write_cover_letter(&plan.cover_letter)?;
    info!("Cover letter saved: {}", cover_letter_path.display());

    let document_path = bundle.document_path(
        &document.base_name(),
        document.format().output_extension(),
    );
    document.save(&document_path)?;
    info!("Tailored resume saved: {}", document_path.display());

    let pdf_path = if config.export_pdf {
        match export_pdf(&document_path).await {
            Ok(path) => {
                info!("PDF exported: {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("PDF export skipped: {e}");
                None
            }
        }
    } else {
        None
    };

    Ok(TailorOutcome {
        company: bundle.company().to_string(),
        output_dir: bundle.dir().to_path_buf(),
        cover_letter_path,
        document_path,
        pdf_path,
        report,
    })
}
