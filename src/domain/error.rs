use thiserror::Error;

use super::ids::JobId;
use super::job::JobStatus;

/// Errors raised by job state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The requested transition is not an edge of the job state machine.
    #[error("job {job_id}: cannot move from {from} to {to}")]
    InvalidTransition {
        job_id: JobId,
        from: JobStatus,
        to: JobStatus,
    },

    /// A job's status, timestamps and error message disagree.
    #[error("job {job_id}: inconsistent record ({reason})")]
    InconsistentRecord { job_id: JobId, reason: &'static str },

    /// A category tag did not name a known corpus.
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    /// A document role did not name a known role.
    #[error("unknown document role: {0}")]
    UnknownRole(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
