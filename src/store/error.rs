use thiserror::Error;

use crate::domain::JobStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors returned by record stores.
pub enum StoreError {
    /// No record with this id.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind ("job", "result", "document").
        kind: &'static str,
        /// Record id.
        id: String,
    },

    /// A record with this id already exists.
    #[error("{kind} already exists: {id}")]
    AlreadyExists {
        /// Record kind.
        kind: &'static str,
        /// Record id.
        id: String,
    },

    /// The record violates an invariant the store enforces.
    #[error("rejected {kind} {id}: {message}")]
    Rejected {
        /// Record kind.
        kind: &'static str,
        /// Record id.
        id: String,
        /// Reason.
        message: String,
    },

    /// The stored record was not in the status the write expected.
    #[error("{kind} {id} is {actual}, expected {expected}")]
    Conflict {
        /// Record kind.
        kind: &'static str,
        /// Record id.
        id: String,
        /// Status the caller read before writing.
        expected: JobStatus,
        /// Status found in the store.
        actual: JobStatus,
    },

    /// The backend could not serve the request.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Error message.
        message: String,
    },
}

impl StoreError {
    /// `true` when retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
