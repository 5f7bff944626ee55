use std::path::PathBuf;

use thiserror::Error;

use crate::domain::DocumentId;

/// Errors returned by text extractors.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    #[error("failed to read {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("document {document_id} has unsupported type '{mime_type}'")]
    UnsupportedType {
        document_id: DocumentId,
        mime_type: String,
    },

    #[error("{path} is not valid UTF-8")]
    InvalidEncoding { path: PathBuf },

    #[error("document {document_id} contains no text")]
    Empty { document_id: DocumentId },
}

pub type ExtractResult<T> = Result<T, ExtractError>;
