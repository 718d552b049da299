// Document intake: format classification and plain-text extraction.
// Supported formats are PDF and DOCX, decided by filename extension alone.
// Extraction is pure and fully in-memory; nothing here touches the filesystem.

mod docx;
mod pdf;

use bytes::Bytes;
use thiserror::Error;

/// Upload formats the service can read, classified from the filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Unsupported,
}

impl DocumentKind {
    /// Classifies by the last dot-suffix of the filename, ASCII
    /// case-insensitive. The bytes are never inspected here.
    pub fn from_filename(filename: &str) -> Self {
        let lowered = filename.to_ascii_lowercase();
        if lowered.ends_with(".pdf") {
            DocumentKind::Pdf
        } else if lowered.ends_with(".docx") {
            DocumentKind::Docx
        } else {
            DocumentKind::Unsupported
        }
    }
}

/// One uploaded file, held in memory for the lifetime of a single request.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub filename: String,
    pub bytes: Bytes,
}

impl UploadedDocument {
    pub fn new(filename: impl Into<String>, bytes: Bytes) -> Self {
        UploadedDocument {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        DocumentKind::from_filename(&self.filename)
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file format: {filename} (only .pdf and .docx are accepted)")]
    UnsupportedFormat { filename: String },

    #[error("failed to extract text from {kind} content: {message}")]
    Unreadable { kind: &'static str, message: String },
}

/// Extracts plain text from an uploaded document.
///
/// Unsupported formats are rejected before any byte is looked at. A document
/// that parses but contains no text at all is treated as unreadable, so
/// callers never receive an empty string.
pub fn extract_text(document: &UploadedDocument) -> Result<String, ExtractError> {
    let (kind, text) = match document.kind() {
        DocumentKind::Pdf => ("PDF", pdf::extract_text(&document.bytes)?),
        DocumentKind::Docx => ("DOCX", docx::extract_text(&document.bytes)?),
        DocumentKind::Unsupported => {
            return Err(ExtractError::UnsupportedFormat {
                filename: document.filename.clone(),
            });
        }
    };

    if text.trim().is_empty() {
        return Err(ExtractError::Unreadable {
            kind,
            message: "no extractable text".to_string(),
        });
    }
    Ok(text)
}
