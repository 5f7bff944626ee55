use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::domain::{DocumentId, JobId};
use crate::queue::QueueError;
use crate::store::StoreError;

/// Errors surfaced to callers of the submission service.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("document not found: {document_id}")]
    DocumentNotFound { document_id: DocumentId },

    #[error("job not found: {job_id}")]
    JobNotFound { job_id: JobId },

    /// The job was not buffered and has been recorded as `Failed`.
    #[error("queue full: job {job_id} not accepted within {timeout:?}")]
    QueueFull { job_id: JobId, timeout: Duration },

    /// The queue is stopped; the job has been recorded as `Failed`.
    #[error("service is shutting down: job {job_id} not accepted")]
    ShuttingDown { job_id: JobId },

    #[error("queue error: {0}")]
    Queue(QueueError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<QueueError> for SubmissionError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::QueueFull { job_id, timeout } => Self::QueueFull { job_id, timeout },
            QueueError::Closed { job_id } => Self::ShuttingDown { job_id },
            other => Self::Queue(other),
        }
    }
}

pub type SubmissionResult<T> = Result<T, SubmissionError>;
