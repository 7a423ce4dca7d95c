/// LLM Client: the single point of entry for all Gemini API calls in the tailor.
///
/// ARCHITECTURAL RULE: No other module may call the model service directly.
/// The pipeline only sees the `TextModel` trait; `GeminiClient` is the
/// production implementation.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication rejected (status {status}): {message}")]
    Auth { status: u16, message: String },

    #[error("Quota or rate limit exceeded: {message}")]
    RateLimited { message: String },

    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model returned empty content")]
    EmptyContent,

    #[error("Model response was blocked: {0}")]
    Blocked(String),
}

impl LlmError {
    /// Network hiccups, 429 and 5xx are worth another attempt; nothing else is.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Http(_) | LlmError::RateLimited { .. } | LlmError::Server { .. }
        )
    }

    fn from_status(status: u16, body: String) -> Self {
        // Try to parse error message
        let message = serde_json::from_str::<GeminiError>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        match status {
            401 | 403 => LlmError::Auth { status, message },
            429 => LlmError::RateLimited { message },
            500..=599 => LlmError::Server { status, message },
            _ => LlmError::Api { status, message },
        }
    }
}

/// A text-completion service: one prompt in, raw text out.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Result<String, LlmError> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(LlmError::Blocked(reason.to_string()));
        }

        let candidate = self.candidates.first().ok_or(LlmError::EmptyContent)?;
        let text: String = candidate
            .content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            return match candidate.finish_reason.as_deref() {
                Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => {
                    Err(LlmError::Blocked(reason.to_string()))
                }
                _ => Err(LlmError::EmptyContent),
            };
        }
        Ok(text)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Wraps the Gemini `generateContent` endpoint with bounded retries on
/// transient failures.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    max_retries: u32,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(config.request_timeout).build()?,
            api_key: config.gemini_api_key.clone(),
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{GEMINI_API_BASE}/{}:generateContent", self.model)
    }

    async fn call_once(&self, body: &GenerateContentRequest<'_>) -> Result<String, LlmError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status.as_u16(), body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&response.text().await?)?;
        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={}, output_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }
        parsed.text()
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    /// Sends one prompt. Retries only transient failures, with exponential
    /// backoff (1s, 2s, 4s, ...).
    async fn complete(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: system }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                response_mime_type: "application/json",
            },
        };

        let mut attempt = 0;
        loop {
            match self.call_once(&body).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = Duration::from_millis(1000 * (1 << (attempt - 1).min(5)));
                    warn!(
                        "Gemini call failed ({e}), retry {attempt}/{} after {}ms",
                        self.max_retries,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let raw = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}], "role": "model"},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 4}
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.text().unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(response.text(), Err(LlmError::EmptyContent)));
    }

    #[test]
    fn test_blocked_prompt_reported() {
        let raw = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let response: GenerateContentResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(response.text(), Err(LlmError::Blocked(r)) if r == "SAFETY"));
    }

    #[test]
    fn test_status_classification() {
        let body = r#"{"error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}}"#;
        match LlmError::from_status(403, body.to_string()) {
            LlmError::Auth { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("expected auth error, got {other:?}"),
        }
        assert!(matches!(
            LlmError::from_status(429, "slow down".into()),
            LlmError::RateLimited { .. }
        ));
        assert!(matches!(
            LlmError::from_status(503, String::new()),
            LlmError::Server { status: 503, .. }
        ));
        assert!(matches!(
            LlmError::from_status(400, "bad".into()),
            LlmError::Api { status: 400, .. }
        ));
    }

    #[test]
    fn test_only_transient_errors_retry() {
        assert!(LlmError::RateLimited {
            message: String::new()
        }
        .is_transient());
        assert!(LlmError::Server {
            status: 500,
            message: String::new()
        }
        .is_transient());
        assert!(!LlmError::Auth {
            status: 401,
            message: String::new()
        }
        .is_transient());
        assert!(!LlmError::EmptyContent.is_transient());
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let body = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: "sys" }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                response_mime_type: "application/json",
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
    }
}
