//! Configuration types for quiz generation.
//!
//! All generation behaviour is controlled through [`GenerationConfig`], built
//! via its [`GenerationConfigBuilder`]. The API key is deliberately absent:
//! it is session state held by a [`crate::credential::CredentialStore`], not
//! configuration, so a config can be logged or shared freely.

use crate::error::QuizError;
use serde::{Deserialize, Serialize};

/// Default Gemini model used for generation.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default Gemini REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Hard cap on the number of characters of document text sent to the model.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 30_000;

/// Configuration for quiz generation.
///
/// Built via [`GenerationConfig::builder()`] or using
/// [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdf2quiz::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .model("gemini-2.5-pro")
///     .temperature(0.4)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_input_chars, 30_000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Gemini model identifier. Default: `gemini-2.5-flash`.
    pub model: String,

    /// Base URL of the generation service, without a trailing slash.
    ///
    /// Overridable so tests and proxies can stand in for the real endpoint.
    pub base_url: String,

    /// Sampling temperature. Default: 0.7.
    ///
    /// Questions benefit from varied phrasing; the strict response schema
    /// keeps the output parseable even at moderate temperature.
    pub temperature: f32,

    /// Maximum number of characters of document text sent per request.
    /// Default: 30 000. Longer documents are clipped silently.
    pub max_input_chars: usize,

    /// Number of multiple-choice questions requested. Default: 5.
    pub multiple_choice_count: usize,

    /// Number of true/false questions requested. Default: 5.
    pub true_false_count: usize,

    /// Number of short-answer questions requested. Default: 3.
    pub short_answer_count: usize,

    /// Per-request timeout in seconds. Default: none (transport default).
    pub request_timeout_secs: Option<u64>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.7,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
            multiple_choice_count: 5,
            true_false_count: 5,
            short_answer_count: 3,
            request_timeout_secs: None,
            download_timeout_secs: 120,
        }
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_input_chars(mut self, n: usize) -> Self {
        self.config.max_input_chars = n;
        self
    }

    pub fn multiple_choice_count(mut self, n: usize) -> Self {
        self.config.multiple_choice_count = n;
        self
    }

    pub fn true_false_count(mut self, n: usize) -> Self {
        self.config.true_false_count = n;
        self
    }

    pub fn short_answer_count(mut self, n: usize) -> Self {
        self.config.short_answer_count = n;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, QuizError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(QuizError::InvalidConfig("Model must not be empty".into()));
        }
        if !(c.base_url.starts_with("http://") || c.base_url.starts_with("https://")) {
            return Err(QuizError::InvalidConfig(format!(
                "Base URL must be HTTP or HTTPS, got '{}'",
                c.base_url
            )));
        }
        if c.max_input_chars == 0 {
            return Err(QuizError::InvalidConfig(
                "max_input_chars must be ≥ 1".into(),
            ));
        }
        if c.request_timeout_secs == Some(0) {
            return Err(QuizError::InvalidConfig(
                "Request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}
