use thiserror::Error;

use crate::vectordb::VectorDbError;

/// Errors returned by embedding, indexing and search.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The embedding provider failed or returned an unusable response.
    #[error("embedding request failed: {message}")]
    Embedding { message: String },

    /// The provider returned a different number of vectors than inputs.
    #[error("embedding count mismatch: sent {expected} inputs, got {actual} vectors")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    /// Vector store failure.
    #[error(transparent)]
    VectorDb(#[from] VectorDbError),

    /// Nothing to index after chunking.
    #[error("document produced no chunks")]
    EmptyDocument,
}

impl RetrievalError {
    /// `true` when retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Embedding { .. } => true,
            Self::VectorDb(e) => e.is_transient(),
            Self::EmbeddingCountMismatch { .. } | Self::EmptyDocument => false,
        }
    }
}

pub type RetrievalResult<T> = Result<T, RetrievalError>;
