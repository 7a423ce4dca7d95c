use std::path::PathBuf;
use std::time::Duration;

use crate::errors::TailorError;

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MAX_RETRIES: u32 = 1;

/// What to do when `outputs/<company>` already exists from an earlier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPolicy {
    /// Write into a fresh sibling directory (`Acme-2`, `Acme-3`, ...).
    Version,
    /// Reuse the directory and replace the files this tool writes.
    Overwrite,
}

/// Application configuration loaded from environment variables.
/// Built once in `main` and passed by reference to every stage.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub model: String,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub output_policy: OutputPolicy,
    pub export_pdf: bool,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self, TailorError> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TailorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gemini_api_key = get("GEMINI_API_KEY").ok_or_else(|| {
            TailorError::Configuration(
                "Required environment variable 'GEMINI_API_KEY' is not set".to_string(),
            )
        })?;

        let request_timeout_secs = match get("TAILOR_REQUEST_TIMEOUT_SECS") {
            Some(raw) => parse_number::<u64>("TAILOR_REQUEST_TIMEOUT_SECS", &raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let max_retries = match get("TAILOR_MAX_RETRIES") {
            Some(raw) => parse_number::<u32>("TAILOR_MAX_RETRIES", &raw)?,
            None => DEFAULT_MAX_RETRIES,
        };
        let output_policy = match get("TAILOR_OUTPUT_POLICY").as_deref().map(str::trim) {
            None | Some("version") => OutputPolicy::Version,
            Some("overwrite") => OutputPolicy::Overwrite,
            Some(other) => {
                return Err(TailorError::Configuration(format!(
                    "TAILOR_OUTPUT_POLICY must be 'version' or 'overwrite', got '{other}'"
                )))
            }
        };
        let export_pdf = match get("TAILOR_EXPORT_PDF") {
            Some(raw) => parse_flag("TAILOR_EXPORT_PDF", &raw)?,
            None => false,
        };

        Ok(Config {
            gemini_api_key,
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            input_dir: get("TAILOR_INPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data")),
            output_dir: get("TAILOR_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("outputs")),
            request_timeout: Duration::from_secs(request_timeout_secs),
            max_retries,
            output_policy,
            export_pdf,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, TailorError> {
    raw.trim().parse::<T>().map_err(|_| {
        TailorError::Configuration(format!("{key} must be a non-negative integer, got '{raw}'"))
    })
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, TailorError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(TailorError::Configuration(format!(
            "{key} must be a boolean, got '{raw}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_configuration_error() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, TailorError::Configuration(_)));
        assert!(err.to_string().contains("GEMINI_API_KEY"));
    }

    #[test]
    fn test_blank_api_key_is_configuration_error() {
        let err = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "   ")])).unwrap_err();
        assert!(matches!(err, TailorError::Configuration(_)));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("GEMINI_API_KEY", "secret")])).unwrap();
        assert_eq!(config.gemini_api_key, "secret");
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.input_dir, PathBuf::from("data"));
        assert_eq!(config.output_dir, PathBuf::from("outputs"));
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.output_policy, OutputPolicy::Version);
        assert!(!config.export_pdf);
        assert_eq!(config.rust_log, "info");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-2.5-pro"),
            ("TAILOR_INPUT_DIR", "/tmp/in"),
            ("TAILOR_OUTPUT_DIR", "/tmp/out"),
            ("TAILOR_REQUEST_TIMEOUT_SECS", "30"),
            ("TAILOR_MAX_RETRIES", "0"),
            ("TAILOR_OUTPUT_POLICY", "overwrite"),
            ("TAILOR_EXPORT_PDF", "yes"),
        ]))
        .unwrap();
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.input_dir, PathBuf::from("/tmp/in"));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.output_policy, OutputPolicy::Overwrite);
        assert!(config.export_pdf);
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "secret"),
            ("TAILOR_REQUEST_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("TAILOR_REQUEST_TIMEOUT_SECS"));
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "secret"),
            ("TAILOR_OUTPUT_POLICY", "merge"),
        ]))
        .unwrap_err();
        assert!(matches!(err, TailorError::Configuration(_)));
    }
}
