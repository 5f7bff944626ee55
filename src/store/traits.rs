use async_trait::async_trait;

use super::error::StoreResult;
use crate::domain::{Document, DocumentId, EvaluationJob, EvaluationResult, JobId, JobStatus};

/// Persistence for evaluation jobs.
///
/// Guarantees:
/// - `create` rejects an id that already exists.
/// - `update` replaces an existing record and fails with `NotFound` otherwise.
/// - `update_if` replaces the record only while its stored status equals
///   `expected`, and fails with `Conflict` otherwise. Status transitions go
///   through it so that two workers holding the same id cannot both move a
///   job out of `Queued`.
/// - `find_pending` returns only `Queued` jobs, oldest first.
/// - Each call is atomic with respect to other calls on the same store.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: &EvaluationJob) -> StoreResult<()>;

    /// Returns `Ok(None)` when the job does not exist.
    async fn find_by_id(&self, id: JobId) -> StoreResult<Option<EvaluationJob>>;

    async fn update(&self, job: &EvaluationJob) -> StoreResult<()>;

    async fn update_if(&self, job: &EvaluationJob, expected: JobStatus) -> StoreResult<()>;

    async fn find_pending(&self, limit: usize) -> StoreResult<Vec<EvaluationJob>>;
}

/// Persistence for evaluation results.
///
/// Guarantees:
/// - At most one result per job; a second `create` for the same job fails
///   with `AlreadyExists`.
/// - A result normally exists only for a `Completed` job. The one exception
///   is a run whose result landed but whose `Completed` write kept failing:
///   that job is recorded as `Failed` (or left `Processing` if even that
///   write fails) and its result row is orphaned. Readers must gate result
///   visibility on the job status, never on the row's presence.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn create(&self, result: &EvaluationResult) -> StoreResult<()>;

    async fn find_by_job_id(&self, job_id: JobId) -> StoreResult<Option<EvaluationResult>>;
}

/// Lookup of uploaded documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create(&self, document: &Document) -> StoreResult<()>;

    /// Returns `Ok(None)` when the document does not exist.
    async fn find_by_id(&self, id: DocumentId) -> StoreResult<Option<Document>>;
}
