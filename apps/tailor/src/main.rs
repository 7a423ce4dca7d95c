mod config;
mod document;
mod errors;
mod llm_client;
mod output;
mod tailoring;

use anyhow::Result;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::GeminiClient;
use crate::tailoring::TailorOutcome;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Configuration first: a missing API key fails before any file is touched
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tailor v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Input: {}, output: {}",
        config.input_dir.display(),
        config.output_dir.display()
    );

    let model = GeminiClient::new(&config)?;
    info!("Model client initialized (model: {})", model.model());

    match tailoring::run(&config, &model).await {
        Ok(outcome) => {
            summarize(&outcome);
            Ok(())
        }
        Err(e) => {
            error!(code = e.code(), stage = e.stage(), "{e}");
            Err(anyhow::Error::new(e).context("tailoring failed"))
        }
    }
}

fn summarize(outcome: &TailorOutcome) {
    info!("Company: {}", outcome.company);
    info!("Output directory: {}", outcome.output_dir.display());
    info!("Cover letter: {}", outcome.cover_letter_path.display());
    info!("Tailored resume: {}", outcome.document_path.display());
    if let Some(pdf) = &outcome.pdf_path {
        info!("PDF: {}", pdf.display());
    }
    info!(
        "Replacements applied: {}, skipped: {}",
        outcome.report.applied.len(),
        outcome.report.skipped.len()
    );
    for mismatch in &outcome.report.skipped {
        warn!("Not applied: {mismatch}");
    }
}
