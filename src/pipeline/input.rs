//! Input resolution: turn a user-supplied path or URL into a [`Document`].
//!
//! A `Document` carries its declared media type alongside the bytes. The
//! orchestrator accepts or rejects a document on that declared type alone;
//! content sniffing (`%PDF` magic) happens later, in the extractor, so a
//! mislabelled file surfaces as an extraction failure.

use crate::error::QuizError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Media type of the only accepted document format.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// An immutable binary document with a declared media type.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    name: String,
    media_type: String,
    bytes: Vec<u8>,
}

impl Document {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Build a document whose media type is inferred from the file name.
    pub fn from_named_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let media_type = media_type_for_name(&name).to_string();
        Self::new(name, media_type, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// True when the declared media type is PDF (parameters ignored).
    pub fn is_pdf(&self) -> bool {
        self.media_type
            .split(';')
            .next()
            .map(|t| t.trim().eq_ignore_ascii_case(PDF_MEDIA_TYPE))
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Map a file name's extension to a media type.
pub fn media_type_for_name(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("pdf") => PDF_MEDIA_TYPE,
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("doc") => "application/msword",
        Some("txt") => "text/plain",
        Some("md") => "text/markdown",
        Some("html") | Some("htm") => "text/html",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an in-memory [`Document`].
pub async fn load_document(input: &str, timeout_secs: u64) -> Result<Document, QuizError> {
    if input.trim().is_empty() {
        return Err(QuizError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

async fn read_local(path_str: &str) -> Result<Document, QuizError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(QuizError::PermissionDenied { path });
        }
        Err(_) => return Err(QuizError::FileNotFound { path }),
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path_str.to_string());

    debug!("Read local document: {} ({} bytes)", path.display(), bytes.len());
    Ok(Document::from_named_bytes(name, bytes))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Document, QuizError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| QuizError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            QuizError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            QuizError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(QuizError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = extract_filename(url);
    let declared = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let bytes = response
        .bytes()
        .await
        .map_err(|e| QuizError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    // Servers often send octet-stream for PDFs; fall back to the extension.
    let media_type = match declared {
        Some(t) if !t.starts_with("application/octet-stream") => t,
        _ => media_type_for_name(&filename).to_string(),
    };

    info!("Downloaded {} bytes ({})", bytes.len(), media_type);
    Ok(Document::new(filename, media_type, bytes.to_vec()))
}

/// Extract a reasonable filename from the URL path.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "downloaded.pdf".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn media_type_from_extension() {
        assert_eq!(media_type_for_name("notes.PDF"), PDF_MEDIA_TYPE);
        assert_eq!(
            media_type_for_name("essay.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
        assert_eq!(media_type_for_name("README"), "application/octet-stream");
    }

    #[test]
    fn is_pdf_ignores_case_and_parameters() {
        let d = Document::new("a", "Application/PDF; charset=binary", vec![]);
        assert!(d.is_pdf());
        let d = Document::new("a.docx", "application/msword", vec![]);
        assert!(!d.is_pdf());
    }

    #[test]
    fn filename_from_url() {
        assert_eq!(extract_filename("https://x.org/papers/intro.pdf"), "intro.pdf");
        assert_eq!(extract_filename("https://x.org/download/"), "downloaded.pdf");
    }

    #[tokio::test]
    async fn load_local_file() {
        let mut tmp = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        tmp.write_all(b"%PDF-1.7 test").unwrap();

        let doc = load_document(tmp.path().to_str().unwrap(), 5).await.unwrap();
        assert!(doc.is_pdf());
        assert_eq!(doc.bytes(), b"%PDF-1.7 test");
    }

    #[tokio::test]
    async fn load_missing_file() {
        let err = load_document("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, QuizError::FileNotFound { .. }));
    }
}
