//! Quiz generation: clipped document text → Gemini → [`QuizData`].
//!
//! This is the only stage with network I/O. Prompt wording and the response
//! schema live in [`crate::prompts`]; payload coercion lives in
//! [`crate::pipeline::normalize`]. What remains here is request building,
//! the HTTP call, and error classification.
//!
//! ## Error classification
//!
//! | Condition | Error |
//! |-----------|-------|
//! | empty API key (checked locally, no request) | [`QuizError::MissingCredential`] |
//! | HTTP 401/403, or a body naming an invalid/expired key | [`QuizError::InvalidCredential`] |
//! | any other HTTP failure, transport error, blocked prompt, bad payload | [`QuizError::GenerationFailed`] |
//!
//! No retries: a retry is the user restarting the pipeline.

use crate::config::{GenerationConfig, DEFAULT_MAX_INPUT_CHARS};
use crate::credential::Credential;
use crate::error::QuizError;
use crate::pipeline::normalize::parse_quiz_payload;
use crate::prompts::{quiz_prompt, quiz_response_schema};
use crate::quiz::QuizData;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Phrases in an error body that identify a rejected key.
const CREDENTIAL_MARKERS: &[&str] = &[
    "api key not valid",
    "api key is not valid",
    "api_key_invalid",
    "api key expired",
];

/// Produces a learning module from document text.
#[async_trait]
pub trait QuizGenerator: Send + Sync {
    async fn generate_quiz(
        &self,
        text: &str,
        credential: &Credential,
    ) -> Result<QuizData, QuizError>;

    /// Characters of document text this generator actually sends.
    fn max_input_chars(&self) -> usize {
        DEFAULT_MAX_INPUT_CHARS
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationSettings,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    pub response_mime_type: String,
    pub response_schema: serde_json::Value,
    pub temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

// ── Request building ─────────────────────────────────────────────────────

/// Return the first `max_chars` characters of `text` (never splits a char).
pub fn clip_text(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Build the `generateContent` request body for a document.
pub fn build_request(text: &str, config: &GenerationConfig) -> GenerateContentRequest {
    let clipped = clip_text(text, config.max_input_chars);
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(quiz_prompt(clipped, config)),
            }],
        }],
        generation_config: GenerationSettings {
            response_mime_type: "application/json".to_string(),
            response_schema: quiz_response_schema(),
            temperature: config.temperature,
        },
    }
}

/// True when an HTTP failure means the key was rejected.
///
/// A 400 counts only when its body names the key; Gemini also answers 400
/// for malformed requests and oversized prompts.
pub fn is_credential_rejection(status: StatusCode, body: &str) -> bool {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return true;
    }
    let lower = body.to_lowercase();
    CREDENTIAL_MARKERS.iter().any(|m| lower.contains(m))
}

// ── Gemini client ────────────────────────────────────────────────────────

/// [`QuizGenerator`] backed by the Gemini `generateContent` REST API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GenerationConfig,
}

impl GeminiClient {
    pub fn new(config: GenerationConfig) -> Result<Self, QuizError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| QuizError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        )
    }
}

#[async_trait]
impl QuizGenerator for GeminiClient {
    fn max_input_chars(&self) -> usize {
        self.config.max_input_chars
    }

    async fn generate_quiz(
        &self,
        text: &str,
        credential: &Credential,
    ) -> Result<QuizData, QuizError> {
        if credential.is_empty() {
            return Err(QuizError::MissingCredential);
        }

        let start = Instant::now();
        let request = build_request(text, &self.config);
        debug!(
            "POST {} (model {}, temperature {})",
            self.endpoint(),
            self.config.model,
            self.config.temperature
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", credential.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    QuizError::generation("request to the generation service timed out")
                } else {
                    QuizError::generation(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| QuizError::generation(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            if is_credential_rejection(status, &body) {
                warn!("Generation service rejected the API key (HTTP {})", status);
                return Err(QuizError::InvalidCredential);
            }
            let detail = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|env| match env.error.status {
                    Some(s) => format!("{} ({})", env.error.message, s),
                    None => env.error.message,
                })
                .unwrap_or(body);
            return Err(QuizError::generation(format!("HTTP {}: {}", status, detail)));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| QuizError::generation(format!("unexpected response shape: {}", e)))?;

        let payload = candidate_text(&parsed)?;
        let quiz = parse_quiz_payload(&payload)?;

        for issue in quiz.integrity_issues() {
            warn!("{}", issue);
        }

        let (tokens_in, tokens_out) = parsed
            .usage_metadata
            .as_ref()
            .map(|u| (u.prompt_token_count, u.candidates_token_count))
            .unwrap_or((0, 0));
        info!(
            "Generated {} items in {:?} ({} tokens in / {} tokens out)",
            quiz.total_items(),
            start.elapsed(),
            tokens_in,
            tokens_out
        );

        Ok(quiz)
    }
}

/// Concatenate the first candidate's text parts.
fn candidate_text(response: &GenerateContentResponse) -> Result<String, QuizError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(QuizError::generation(format!(
            "the document was blocked by the service ({})",
            reason
        )));
    }

    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| QuizError::generation("the service returned no candidates"))?;

    let text: String = candidate
        .content
        .as_ref()
        .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect::<String>())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
        return Err(QuizError::generation(format!(
            "the service returned no content (finish reason: {})",
            reason
        )));
    }
    Ok(text)
}
