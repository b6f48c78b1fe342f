//! Pipeline stages for PDF-to-quiz generation.
//!
//! Each submodule implements exactly one transformation step. The
//! [`crate::orchestrator`] sequences them and owns all state; the stages
//! themselves are stateless.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ generate ──▶ normalize
//! (path/URL)  (pdfium)   (Gemini)     (schema coercion)
//! ```
//!
//! 1. [`input`]     — read a local file or download a URL into a `Document`
//! 2. [`extract`]   — pull plain text out of the PDF; runs in `spawn_blocking`
//! 3. [`generate`]  — clip text, call the service with a strict schema,
//!    classify failures; the only stage with network I/O
//! 4. [`normalize`] — turn the untyped payload into `QuizData` with all four
//!    sections present

pub mod extract;
pub mod generate;
pub mod input;
pub mod normalize;
