//! In-memory stores backed by `parking_lot` locks.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::{StoreError, StoreResult};
use super::traits::{DocumentStore, JobStore, ResultStore};
use crate::domain::{Document, DocumentId, EvaluationJob, EvaluationResult, JobId, JobStatus};

/// Job store backed by a `HashMap<JobId, EvaluationJob>`.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: RwLock<HashMap<JobId, EvaluationJob>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    fn check(job: &EvaluationJob) -> StoreResult<()> {
        job.check_consistency().map_err(|e| StoreError::Rejected {
            kind: "job",
            id: job.id().to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, job: &EvaluationJob) -> StoreResult<()> {
        Self::check(job)?;
        let mut jobs = self.jobs.write();
        if jobs.contains_key(&job.id()) {
            return Err(StoreError::AlreadyExists {
                kind: "job",
                id: job.id().to_string(),
            });
        }
        jobs.insert(job.id(), job.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: JobId) -> StoreResult<Option<EvaluationJob>> {
        Ok(self.jobs.read().get(&id).cloned())
    }

    async fn update(&self, job: &EvaluationJob) -> StoreResult<()> {
        Self::check(job)?;
        let mut jobs = self.jobs.write();
        match jobs.get_mut(&job.id()) {
            Some(slot) => {
                *slot = job.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                kind: "job",
                id: job.id().to_string(),
            }),
        }
    }

    async fn update_if(&self, job: &EvaluationJob, expected: JobStatus) -> StoreResult<()> {
        Self::check(job)?;
        let mut jobs = self.jobs.write();
        let Some(slot) = jobs.get_mut(&job.id()) else {
            return Err(StoreError::NotFound {
                kind: "job",
                id: job.id().to_string(),
            });
        };
        if slot.status() != expected {
            return Err(StoreError::Conflict {
                kind: "job",
                id: job.id().to_string(),
                expected,
                actual: slot.status(),
            });
        }
        *slot = job.clone();
        Ok(())
    }

    async fn find_pending(&self, limit: usize) -> StoreResult<Vec<EvaluationJob>> {
        let jobs = self.jobs.read();
        let mut pending: Vec<EvaluationJob> = jobs
            .values()
            .filter(|job| job.status() == JobStatus::Queued)
            .cloned()
            .collect();
        pending.sort_by_key(|job| job.created_at());
        pending.truncate(limit);
        Ok(pending)
    }
}

/// Result store keyed by owning job.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    results: RwLock<HashMap<JobId, EvaluationResult>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.results.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.read().is_empty()
    }
}

#[async_trait]
impl ResultStore for MemoryResultStore {
    async fn create(&self, result: &EvaluationResult) -> StoreResult<()> {
        let mut results = self.results.write();
        if results.contains_key(&result.job_id) {
            return Err(StoreError::AlreadyExists {
                kind: "result",
                id: result.job_id.to_string(),
            });
        }
        results.insert(result.job_id, result.clone());
        Ok(())
    }

    async fn find_by_job_id(&self, job_id: JobId) -> StoreResult<Option<EvaluationResult>> {
        Ok(self.results.read().get(&job_id).cloned())
    }
}

/// Document registry.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<DocumentId, Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, document: &Document) -> StoreResult<()> {
        let mut documents = self.documents.write();
        if documents.contains_key(&document.id) {
            return Err(StoreError::AlreadyExists {
                kind: "document",
                id: document.id.to_string(),
            });
        }
        documents.insert(document.id, document.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: DocumentId) -> StoreResult<Option<Document>> {
        Ok(self.documents.read().get(&id).cloned())
    }
}
