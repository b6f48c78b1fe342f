//! Text extraction: PDF bytes → plain text.
//!
//! The orchestrator only sees the [`TextExtractor`] trait. [`PdfiumExtractor`]
//! is the default implementation; it runs pdfium inside `spawn_blocking`
//! because the library keeps thread-local state and is CPU-bound.
//!
//! Any failure (bad magic bytes, corrupt xref, password, image-only pages)
//! is reported as [`QuizError::Extraction`]. No partial text is returned.

use crate::error::QuizError;
use crate::pipeline::input::Document;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// Converts a document into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, document: &Document) -> Result<String, QuizError>;
}

/// pdfium-backed extractor.
///
/// Library resolution order: `PDFIUM_LIB_PATH`, the explicit `library_path`
/// given to [`PdfiumExtractor::with_library`], the working directory, then
/// the system library search path.
#[derive(Debug, Clone, Default)]
pub struct PdfiumExtractor {
    library_path: Option<PathBuf>,
}

impl PdfiumExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }
}

#[async_trait]
impl TextExtractor for PdfiumExtractor {
    async fn extract(&self, document: &Document) -> Result<String, QuizError> {
        if !has_pdf_magic(document.bytes()) {
            return Err(QuizError::extraction(format!(
                "'{}' does not start with a PDF header",
                document.name()
            )));
        }

        let bytes = document.bytes().to_vec();
        let library_path = self.library_path.clone();
        let name = document.name().to_string();

        let text = tokio::task::spawn_blocking(move || {
            extract_text_blocking(&bytes, library_path.as_ref())
        })
        .await
        .map_err(|e| QuizError::Internal(format!("Extraction task panicked: {}", e)))??;

        info!("Extracted {} characters from '{}'", text.chars().count(), name);
        Ok(text)
    }
}

/// True when the bytes begin with the `%PDF` signature.
pub fn has_pdf_magic(bytes: &[u8]) -> bool {
    bytes.len() >= 4 && &bytes[..4] == b"%PDF"
}

fn bind_pdfium(library_path: Option<&PathBuf>) -> Result<Pdfium, QuizError> {
    let explicit = std::env::var_os("PDFIUM_LIB_PATH")
        .map(PathBuf::from)
        .or_else(|| library_path.cloned());

    let bindings = match explicit {
        Some(path) => Pdfium::bind_to_library(&path),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| {
        QuizError::extraction(format!(
            "PDF engine unavailable ({:?}). Set PDFIUM_LIB_PATH=/path/to/libpdfium.",
            e
        ))
    })?;

    Ok(Pdfium::new(bindings))
}

fn extract_text_blocking(bytes: &[u8], library_path: Option<&PathBuf>) -> Result<String, QuizError> {
    let pdfium = bind_pdfium(library_path)?;

    let document = pdfium.load_pdf_from_byte_slice(bytes, None).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            QuizError::extraction("document is password protected")
        } else {
            QuizError::extraction(format!("document is corrupt: {}", err_str))
        }
    })?;

    let pages = document.pages();
    debug!("PDF loaded: {} pages", pages.len());

    let mut parts = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        let text = page.text().map_err(|e| {
            QuizError::extraction(format!("page {} text unreadable: {:?}", idx + 1, e))
        })?;
        parts.push(text.all());
    }

    let text = parts.join("\n");
    if text.trim().is_empty() {
        return Err(QuizError::extraction(
            "no text found (the PDF may contain only scanned images)",
        ));
    }
    Ok(text)
}
