//! One-shot entry points: document in, quiz out.
//!
//! These wrap a fresh [`Orchestrator`] per call with a session credential
//! store, the pdfium extractor and the Gemini client. Use the orchestrator
//! directly when you need credential re-entry or retries within a session
//! (the CLI does).

use crate::config::GenerationConfig;
use crate::credential::{Credential, SessionCredentialStore};
use crate::error::QuizError;
use crate::export::format_quiz_for_export;
use crate::observer::{NoopObserver, SharedObserver};
use crate::orchestrator::Orchestrator;
use crate::pipeline::extract::{PdfiumExtractor, TextExtractor};
use crate::pipeline::generate::GeminiClient;
use crate::pipeline::input::{self, Document};
use crate::quiz::QuizData;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// File format for [`generate_quiz_to_file`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// The "Quiz & Summaries" text document.
    #[default]
    Text,
    /// Pretty-printed `QuizData` JSON (camelCase keys).
    Json,
}

impl OutputFormat {
    fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "json",
        }
    }
}

/// Generate a quiz from a PDF file path or HTTP(S) URL.
///
/// # Errors
/// - input errors (`FileNotFound`, `DownloadFailed`, …) before the pipeline starts
/// - `MissingCredential` for a blank key
/// - otherwise the error that parked the pipeline in `Failed`
///
/// An `Ok` result may be empty; check [`QuizData::is_empty`].
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdf2quiz::{generate_quiz, GenerationConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let key = std::env::var("GEMINI_API_KEY")?;
/// let quiz = generate_quiz("lecture.pdf", key, &GenerationConfig::default()).await?;
/// println!("{} questions", quiz.total_items());
/// # Ok(())
/// # }
/// ```
pub async fn generate_quiz(
    input_str: impl AsRef<str>,
    credential: impl Into<Credential>,
    config: &GenerationConfig,
) -> Result<QuizData, QuizError> {
    let input_str = input_str.as_ref();
    info!("Generating quiz for: {}", input_str);
    let document = input::load_document(input_str, config.download_timeout_secs).await?;
    run_pipeline(
        document,
        credential.into(),
        config,
        Arc::new(PdfiumExtractor::new()),
        Arc::new(NoopObserver),
    )
    .await
}

/// Generate a quiz from PDF bytes already in memory.
///
/// `name` is used for the media type (by extension) and in logs.
pub async fn generate_quiz_from_bytes(
    bytes: &[u8],
    name: &str,
    credential: impl Into<Credential>,
    config: &GenerationConfig,
) -> Result<QuizData, QuizError> {
    let document = Document::from_named_bytes(name, bytes.to_vec());
    run_pipeline(
        document,
        credential.into(),
        config,
        Arc::new(PdfiumExtractor::new()),
        Arc::new(NoopObserver),
    )
    .await
}

/// Run one document through a fresh orchestrator with the given extractor.
pub async fn run_pipeline(
    document: Document,
    credential: Credential,
    config: &GenerationConfig,
    extractor: Arc<dyn TextExtractor>,
    observer: SharedObserver,
) -> Result<QuizData, QuizError> {
    let generator = Arc::new(GeminiClient::new(config.clone())?);
    let mut orchestrator = Orchestrator::new(SessionCredentialStore::new(), extractor, generator)
        .with_observer(observer);

    orchestrator.submit_credential(credential)?;
    orchestrator.process(document).await?;

    if let Some(quiz) = orchestrator.state().quiz() {
        return Ok(quiz.clone());
    }
    let fallback = match orchestrator.state().failure() {
        Some(failure) => failure.detail.clone(),
        None => format!("pipeline stopped while {}", orchestrator.state().kind()),
    };
    Err(orchestrator
        .take_error()
        .unwrap_or(QuizError::Internal(fallback)))
}

/// Synchronous wrapper around [`generate_quiz`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_quiz_sync(
    input_str: impl AsRef<str>,
    credential: impl Into<Credential>,
    config: &GenerationConfig,
) -> Result<QuizData, QuizError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| QuizError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_quiz(input_str, credential, config))
}

/// Generate a quiz and write it to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
/// Returns the quiz so callers can report counts.
pub async fn generate_quiz_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    credential: impl Into<Credential>,
    format: OutputFormat,
    config: &GenerationConfig,
) -> Result<QuizData, QuizError> {
    let quiz = generate_quiz(input_str, credential, config).await?;
    write_quiz(&quiz, output_path, format).await?;
    Ok(quiz)
}

/// Write `quiz` to `output_path` in the given format.
///
/// Uses atomic write (temp file + rename); parent directories are created.
pub async fn write_quiz(
    quiz: &QuizData,
    output_path: impl AsRef<Path>,
    format: OutputFormat,
) -> Result<(), QuizError> {
    let body = render(quiz, format)?;
    write_atomic(output_path.as_ref(), &body, format).await
}

/// Render a quiz in the requested output format.
pub fn render(quiz: &QuizData, format: OutputFormat) -> Result<String, QuizError> {
    match format {
        OutputFormat::Text => Ok(format_quiz_for_export(quiz)),
        OutputFormat::Json => serde_json::to_string_pretty(quiz)
            .map_err(|e| QuizError::Internal(format!("JSON serialisation failed: {}", e))),
    }
}

async fn write_atomic(path: &Path, body: &str, format: OutputFormat) -> Result<(), QuizError> {
    let write_err = |source: std::io::Error| QuizError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension(format!("{}.tmp", format.extension()));
    tokio::fs::write(&tmp_path, body).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    info!("Wrote {} bytes to {}", body.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::TopicSummary;

    fn quiz() -> QuizData {
        QuizData {
            topic_summaries: vec![TopicSummary {
                topic: "Tides".into(),
                summary: "Caused by the moon.".into(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn render_json_uses_wire_keys() {
        let json = render(&quiz(), OutputFormat::Json).unwrap();
        assert!(json.contains("\"topicSummaries\""));
        assert!(json.contains("\"multipleChoice\": []"));
    }

    #[test]
    fn render_text_is_export() {
        let text = render(&quiz(), OutputFormat::Text).unwrap();
        assert!(text.starts_with("Quiz & Summaries"));
        assert!(text.contains("Topic: Tides"));
    }

    #[tokio::test]
    async fn write_atomic_creates_parent_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("quiz.txt");
        write_atomic(&path, "hello", OutputFormat::Text).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
        assert!(!path.with_extension("txt.tmp").exists());
    }

    #[tokio::test]
    async fn missing_file_is_reported_before_credential_check() {
        let err = generate_quiz("/no/such/file.pdf", "", &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn blank_credential_is_refused() {
        let err = generate_quiz_from_bytes(b"%PDF-1.4", "a.pdf", "  ", &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::MissingCredential));
    }

    #[tokio::test]
    async fn non_pdf_bytes_are_unsupported() {
        let err = generate_quiz_from_bytes(b"hello", "notes.txt", "key", &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::UnsupportedFileType { .. }));
    }
}
