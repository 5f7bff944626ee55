//! Document text extraction.
//!
//! [`FileTextExtractor`] reads plain-text uploads from disk and normalizes
//! them. Binary formats are reported as unsupported rather than guessed at.

pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;


use std::path::Path;

use async_trait::async_trait;

pub use error::{ExtractError, ExtractResult};
#[cfg(any(test, feature = "mock"))]
pub use mock::StaticExtractor;

use crate::domain::Document;

/// MIME types the file extractor accepts.
pub const SUPPORTED_MIME_TYPES: &[&str] = &["text/plain", "text/markdown"];

/// Turns a stored document into normalized plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Returns non-empty text or an error; never a partial document.
    async fn extract_text(&self, document: &Document) -> ExtractResult<String>;
}

/// Reads UTF-8 text documents from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FileTextExtractor;

impl FileTextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn is_supported(document: &Document) -> bool {
        let mime = document.mime_type.split(';').next().unwrap_or_default().trim();
        if SUPPORTED_MIME_TYPES.contains(&mime) {
            return true;
        }
        Path::new(&document.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "txt" | "md"))
    }
}

#[async_trait]
impl TextExtractor for FileTextExtractor {
    async fn extract_text(&self, document: &Document) -> ExtractResult<String> {
        if !Self::is_supported(document) {
            return Err(ExtractError::UnsupportedType {
                document_id: document.id,
                mime_type: document.mime_type.clone(),
            });
        }

        let bytes = tokio::fs::read(&document.file_path)
            .await
            .map_err(|e| ExtractError::Io {
                path: document.file_path.clone(),
                message: e.to_string(),
            })?;

        let raw = String::from_utf8(bytes).map_err(|_| ExtractError::InvalidEncoding {
            path: document.file_path.clone(),
        })?;

        let text = normalize_text(&raw);
        if text.is_empty() {
            return Err(ExtractError::Empty {
                document_id: document.id,
            });
        }

        tracing::debug!(document_id = %document.id, chars = text.chars().count(), "extracted text");
        Ok(text)
    }
}

/// Trims every line and drops blank ones.
pub fn normalize_text(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
