//! # edgequake-pdf2quiz
//!
//! Turn a PDF into study material: multiple-choice, true/false and
//! short-answer questions plus per-topic summaries, generated by Gemini.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Extract    plain text via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Generate   clip to 30 000 chars, one generateContent call
//!  │                with a strict response schema
//!  ├─ 4. Normalise  every section present, malformed items dropped
//!  └─ 5. Present    Results / NoContent / Error screens, text export
//! ```
//!
//! The [`Orchestrator`] sequences these stages as a state machine and owns
//! the API key through an injected [`CredentialStore`]. Every stage error is
//! caught and classified; a rejected key routes the user back to key entry.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2quiz::{format_quiz_for_export, generate_quiz, GenerationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let key = std::env::var("GEMINI_API_KEY")?;
//!     let quiz = generate_quiz("lecture.pdf", key, &GenerationConfig::default()).await?;
//!     print!("{}", format_quiz_for_export(&quiz));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2quiz` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ```toml
//! edgequake-pdf2quiz = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod credential;
pub mod error;
pub mod export;
pub mod observer;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod quiz;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder};
pub use convert::{
    generate_quiz, generate_quiz_from_bytes, generate_quiz_sync, generate_quiz_to_file,
    render, run_pipeline, write_quiz, OutputFormat,
};
pub use credential::{Credential, CredentialStore, SessionCredentialStore};
pub use error::QuizError;
pub use export::format_quiz_for_export;
pub use observer::{NoopObserver, PipelineObserver, SharedObserver};
pub use orchestrator::{
    FailureKind, Orchestrator, PipelineFailure, PipelineState, Screen, StateKind,
};
pub use pipeline::extract::{PdfiumExtractor, TextExtractor};
pub use pipeline::generate::{GeminiClient, QuizGenerator};
pub use pipeline::input::Document;
pub use quiz::{
    MultipleChoiceQuestion, QuizData, ShortAnswerQuestion, TopicSummary, TrueFalseQuestion,
};
