use std::time::Duration;

use thiserror::Error;

use crate::domain::{Category, DocumentId, JobId};
use crate::extract::ExtractError;
use crate::retrieval::RetrievalError;
use crate::scoring::ScoringError;
use crate::store::StoreError;

/// Why a pipeline run did not complete.
///
/// The `Display` text becomes the job's stored error message.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("job not found: {job_id}")]
    JobNotFound { job_id: JobId },

    #[error("document not found: {document_id}")]
    DocumentNotFound { document_id: DocumentId },

    /// The job was not `Queued` when a worker picked it up.
    #[error("invalid job transition: {message}")]
    InvalidTransition { message: String },

    #[error("extraction failed for {side} document {document_id}: {source}")]
    ExtractionFailed {
        side: &'static str,
        document_id: DocumentId,
        #[source]
        source: ExtractError,
    },

    #[error("retrieval failed for {category} context: {source}")]
    RetrievalFailed {
        category: Category,
        #[source]
        source: RetrievalError,
    },

    /// Scorer output was malformed or out of range.
    #[error("invalid score from {step}: {source}")]
    InvalidScore {
        step: &'static str,
        #[source]
        source: ScoringError,
    },

    /// The scorer itself failed (provider unreachable, rejected request).
    #[error("scoring failed at {step}: {source}")]
    ScoringFailed {
        step: &'static str,
        #[source]
        source: ScoringError,
    },

    #[error("synthesis failed: {source}")]
    SynthesisFailed {
        #[source]
        source: ScoringError,
    },

    #[error("timed out at {step} (job deadline {timeout:?})")]
    Timeout { step: &'static str, timeout: Duration },

    #[error("persisting {what} for job {job_id} failed after {attempts} attempts: {source}")]
    PersistenceFailed {
        what: &'static str,
        job_id: JobId,
        attempts: u32,
        #[source]
        source: StoreError,
    },

    /// A read from a record store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
