//! Job submission and status lookup.
//!
//! The service is the only place jobs are created. It validates the request,
//! writes the job as `Queued`, and hands its id to the [`JobQueue`].

pub mod error;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

pub use error::{SubmissionError, SubmissionResult};

use crate::domain::{
    Document, DocumentId, DocumentRole, EvaluationJob, EvaluationResult, JobId, JobStatus,
};
use crate::queue::{JobQueue, QueueError};
use crate::store::Stores;

/// Writes attempted when recording a job the queue refused.
const REJECT_WRITE_ATTEMPTS: u32 = 2;

/// A job and, once it completed, its result.
#[derive(Debug, Clone, Serialize)]
pub struct JobStatusView {
    pub job: EvaluationJob,
    pub result: Option<EvaluationResult>,
}

pub struct EvaluationService {
    stores: Stores,
    queue: Arc<JobQueue>,
    upload_dir: PathBuf,
}

impl EvaluationService {
    pub fn new(stores: Stores, queue: Arc<JobQueue>, upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            stores,
            queue,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn queue(&self) -> &Arc<JobQueue> {
        &self.queue
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Validates the request and stores a new `Queued` job without enqueueing it.
    pub async fn create_job(
        &self,
        title: &str,
        subject_id: DocumentId,
        reference_id: DocumentId,
    ) -> SubmissionResult<EvaluationJob> {
        let title = title.trim();
        if title.is_empty() {
            return Err(SubmissionError::InvalidInput {
                reason: "title must not be empty".to_string(),
            });
        }

        for document_id in [subject_id, reference_id] {
            if self.stores.documents.find_by_id(document_id).await?.is_none() {
                return Err(SubmissionError::DocumentNotFound { document_id });
            }
        }

        let job = EvaluationJob::new(title, subject_id, reference_id);
        self.stores.jobs.create(&job).await?;
        debug!(job_id = %job.id(), "job created");
        Ok(job)
    }

    /// Creates a job and enqueues it.
    ///
    /// If the queue refuses the id (`QueueFull`, `ShuttingDown`) the caller's
    /// request is rejected, so the stored job is moved to `Failed` with the
    /// refusal as its error before the error is returned.
    #[instrument(skip(self))]
    pub async fn submit(
        &self,
        title: &str,
        subject_id: DocumentId,
        reference_id: DocumentId,
    ) -> SubmissionResult<EvaluationJob> {
        let job = self.create_job(title, subject_id, reference_id).await?;
        if let Err(e) = self.queue.enqueue(job.id()).await {
            let err = SubmissionError::from(e);
            self.reject(job, &err).await;
            return Err(err);
        }
        info!(job_id = %job.id(), "job submitted");
        Ok(job)
    }

    async fn reject(&self, mut job: EvaluationJob, reason: &SubmissionError) {
        let job_id = job.id();
        let transitioned = job
            .mark_processing()
            .and_then(|()| job.mark_failed(format!("not enqueued: {reason}")));
        if let Err(e) = transitioned {
            error!(%job_id, error = %e, "could not fail rejected job");
            return;
        }

        for attempt in 1..=REJECT_WRITE_ATTEMPTS {
            match self.stores.jobs.update_if(&job, JobStatus::Queued).await {
                Ok(()) => {
                    debug!(%job_id, "rejected job recorded as failed");
                    return;
                }
                Err(e) if e.is_transient() && attempt < REJECT_WRITE_ATTEMPTS => {
                    warn!(%job_id, attempt, error = %e, "rejected job write failed, retrying");
                }
                Err(e) => {
                    error!(%job_id, error = %e, "rejected job left queued");
                    return;
                }
            }
        }
    }

    /// Returns the job and, only when it is `Completed`, its result.
    pub async fn get_status(&self, job_id: JobId) -> SubmissionResult<JobStatusView> {
        let job = self
            .stores
            .jobs
            .find_by_id(job_id)
            .await?
            .ok_or(SubmissionError::JobNotFound { job_id })?;

        let result = if job.status() == JobStatus::Completed {
            self.stores.results.find_by_job_id(job_id).await?
        } else {
            None
        };

        Ok(JobStatusView { job, result })
    }

    /// Re-enqueues up to `limit` stored `Queued` jobs, oldest first.
    ///
    /// Stops early when the buffer stays full; the rest remain `Queued`.
    pub async fn requeue_pending(&self, limit: usize) -> SubmissionResult<usize> {
        let pending = self.stores.jobs.find_pending(limit).await?;
        let total = pending.len();
        let mut requeued = 0;

        for job in pending {
            match self.queue.enqueue(job.id()).await {
                Ok(()) => requeued += 1,
                Err(QueueError::QueueFull { .. }) => {
                    warn!(requeued, remaining = total - requeued, "queue full while requeueing");
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        if requeued > 0 {
            info!(requeued, "pending jobs requeued");
        }
        Ok(requeued)
    }

    /// Writes an uploaded text document under the upload directory and registers it.
    pub async fn upload_document(
        &self,
        role: DocumentRole,
        filename: &str,
        body: &[u8],
    ) -> SubmissionResult<Document> {
        let filename = Path::new(filename.trim())
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| SubmissionError::InvalidInput {
                reason: "filename must name a file".to_string(),
            })?
            .to_string();
        if body.is_empty() {
            return Err(SubmissionError::InvalidInput {
                reason: "document body is empty".to_string(),
            });
        }

        tokio::fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(|source| SubmissionError::Io {
                path: self.upload_dir.clone(),
                source,
            })?;

        let mut document = Document::new(role, filename.clone(), PathBuf::new(), 0, mime_for(&filename));
        let path = self.upload_dir.join(format!("{}_{}", document.id, filename));
        tokio::fs::write(&path, body)
            .await
            .map_err(|source| SubmissionError::Io {
                path: path.clone(),
                source,
            })?;
        document.file_path = path;
        document.size_bytes = body.len() as u64;

        self.stores.documents.create(&document).await?;
        info!(document_id = %document.id, %role, size = body.len(), "document uploaded");
        Ok(document)
    }
}

fn mime_for(filename: &str) -> &'static str {
    match Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        None | Some("txt") | Some("text") => "text/plain",
        Some("md") | Some("markdown") => "text/markdown",
        Some("pdf") => "application/pdf",
        Some(_) => "application/octet-stream",
    }
}
