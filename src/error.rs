//! Error types for the edgequake-pdf2quiz library.
//!
//! A single fatal error type, [`QuizError`], covers every way the pipeline
//! can stop: bad input, unreadable PDF, missing or rejected API key, and a
//! failed or unparseable generation call.
//!
//! Inside the [`crate::orchestrator::Orchestrator`] these errors never escape:
//! they are classified into a [`crate::orchestrator::PipelineFailure`] and
//! parked in the `Failed` state. Only the one-shot helpers in
//! [`crate::convert`] hand them back to the caller as `Err(QuizError)`.

use std::path::PathBuf;
use thiserror::Error;

/// Case-insensitive phrase that marks an error as a credential rejection.
///
/// The orchestrator searches error messages for this substring. It matches
/// the wording of [`QuizError::InvalidCredential`] and of the service's own
/// rejection text. This is string matching against a collaborator's wording
/// and will break silently if that wording changes.
pub const CREDENTIAL_REJECTION_MARKER: &str = "api key is not valid";

/// All fatal errors returned by the edgequake-pdf2quiz library.
#[derive(Debug, Error)]
pub enum QuizError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The selected document does not declare a PDF media type.
    #[error("Only PDF files are accepted (got '{media_type}').")]
    UnsupportedFileType { media_type: String },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Text could not be extracted: corrupt, encrypted, or image-only.
    #[error("Could not extract text from the document: {detail}")]
    Extraction { detail: String },

    // ── Generation errors ─────────────────────────────────────────────────
    /// No API key was available when generation was requested.
    #[error("API Key is missing. Please provide a valid key.")]
    MissingCredential,

    /// The generation service rejected the API key.
    #[error("Your API Key is not valid. Please check the key and try again.")]
    InvalidCredential,

    /// Any other generation failure: transport, service, or payload.
    #[error(
        "The AI failed to generate a quiz: {detail}\n\
The content may be too short or complex, or the service may be temporarily unavailable."
    )]
    GenerationFailed { detail: String },

    // ── State machine errors ──────────────────────────────────────────────
    /// A transition was requested from a state that does not allow it.
    #[error("Cannot {action} while the pipeline is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl QuizError {
    /// Shorthand for [`QuizError::GenerationFailed`].
    pub fn generation(detail: impl Into<String>) -> Self {
        QuizError::GenerationFailed {
            detail: detail.into(),
        }
    }

    /// Shorthand for [`QuizError::Extraction`].
    pub fn extraction(detail: impl Into<String>) -> Self {
        QuizError::Extraction {
            detail: detail.into(),
        }
    }

    /// True when the user must supply a different API key to make progress.
    ///
    /// A missing key counts, as does any error whose message carries
    /// [`CREDENTIAL_REJECTION_MARKER`].
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, QuizError::MissingCredential)
            || self
                .to_string()
                .to_lowercase()
                .contains(CREDENTIAL_REJECTION_MARKER)
    }
}
