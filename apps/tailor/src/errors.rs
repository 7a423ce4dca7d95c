use std::path::PathBuf;

use thiserror::Error;

use crate::llm_client::LlmError;

/// Fatal pipeline error.
/// Every variant aborts the run; recoverable misses are reported as
/// `ReplacementMismatch` values instead (see `tailoring::edit_plan`).
#[derive(Debug, Error)]
pub enum TailorError {
    #[error("Input discovery failed: {0}")]
    InputDiscovery(String),

    #[error("Unsupported document format '.{extension}' for {}", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("Could not read {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Language model service error: {0}")]
    Service(#[from] LlmError),

    #[error("Model response is not a valid edit plan: {0}")]
    ResponseFormat(String),

    #[error("Could not write {}: {reason}", path.display())]
    DocumentWrite { path: PathBuf, reason: String },
}

impl TailorError {
    pub fn read(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        TailorError::Read {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        TailorError::DocumentWrite {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Stable machine-readable code, logged next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            TailorError::InputDiscovery(_) => "INPUT_DISCOVERY_ERROR",
            TailorError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT_ERROR",
            TailorError::Read { .. } => "READ_ERROR",
            TailorError::Configuration(_) => "CONFIGURATION_ERROR",
            TailorError::Precondition(_) => "PRECONDITION_ERROR",
            TailorError::Service(_) => "SERVICE_ERROR",
            TailorError::ResponseFormat(_) => "RESPONSE_FORMAT_ERROR",
            TailorError::DocumentWrite { .. } => "DOCUMENT_WRITE_ERROR",
        }
    }

    /// Pipeline stage the error surfaced in.
    pub fn stage(&self) -> &'static str {
        match self {
            TailorError::Configuration(_) => "configuration",
            TailorError::InputDiscovery(_) => "document locator",
            TailorError::UnsupportedFormat { .. } | TailorError::Read { .. } => "document reader",
            TailorError::Precondition(_) => "prompt builder",
            TailorError::Service(_) => "model client",
            TailorError::ResponseFormat(_) => "response validator",
            TailorError::DocumentWrite { .. } => "document editor",
        }
    }
}
