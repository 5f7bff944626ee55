use std::time::Duration;

use thiserror::Error;

use crate::domain::JobId;

/// Errors returned by the job queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueError {
    /// The buffer stayed full for the whole enqueue timeout.
    #[error("queue full: job {job_id} not accepted within {timeout:?}")]
    QueueFull { job_id: JobId, timeout: Duration },

    /// The queue has been stopped.
    #[error("queue closed: job {job_id} not accepted")]
    Closed { job_id: JobId },

    /// `start` was called more than once.
    #[error("queue workers already started")]
    AlreadyStarted,

    /// `start` was called after `stop`.
    #[error("queue already stopped")]
    Stopped,

    #[error("invalid queue config: {reason}")]
    InvalidConfig { reason: String },
}

pub type QueueResult<T> = Result<T, QueueError>;
