//! Failure-injecting store wrappers for exercising persistence retries.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{StoreError, StoreResult};
use super::memory::{MemoryJobStore, MemoryResultStore};
use super::traits::{JobStore, ResultStore};
use crate::domain::{EvaluationJob, EvaluationResult, JobId, JobStatus};

/// Wraps a [`MemoryJobStore`] and fails a set number of updates per target status.
#[derive(Debug, Default)]
pub struct FlakyJobStore {
    inner: Arc<MemoryJobStore>,
    failures: Mutex<HashMap<JobStatus, usize>>,
    update_calls: AtomicUsize,
}

impl FlakyJobStore {
    pub fn new(inner: Arc<MemoryJobStore>) -> Self {
        Self {
            inner,
            failures: Mutex::new(HashMap::new()),
            update_calls: AtomicUsize::new(0),
        }
    }

    /// The next `times` updates that write `status` fail with `Unavailable`.
    pub fn fail_updates_to(&self, status: JobStatus, times: usize) {
        self.failures.lock().insert(status, times);
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &Arc<MemoryJobStore> {
        &self.inner
    }

    fn inject(&self, job: &EvaluationJob) -> StoreResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut failures = self.failures.lock();
        if let Some(remaining) = failures.get_mut(&job.status())
            && *remaining > 0
        {
            *remaining -= 1;
            return Err(StoreError::Unavailable {
                message: format!("injected failure writing {}", job.status()),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl JobStore for FlakyJobStore {
    async fn create(&self, job: &EvaluationJob) -> StoreResult<()> {
        self.inner.create(job).await
    }

    async fn find_by_id(&self, id: JobId) -> StoreResult<Option<EvaluationJob>> {
        self.inner.find_by_id(id).await
    }

    async fn update(&self, job: &EvaluationJob) -> StoreResult<()> {
        self.inject(job)?;
        self.inner.update(job).await
    }

    async fn update_if(&self, job: &EvaluationJob, expected: JobStatus) -> StoreResult<()> {
        self.inject(job)?;
        self.inner.update_if(job, expected).await
    }

    async fn find_pending(&self, limit: usize) -> StoreResult<Vec<EvaluationJob>> {
        self.inner.find_pending(limit).await
    }
}

/// Wraps a [`MemoryResultStore`] and fails the next N creates.
#[derive(Debug, Default)]
pub struct FlakyResultStore {
    inner: Arc<MemoryResultStore>,
    remaining_failures: AtomicUsize,
    create_calls: AtomicUsize,
}

impl FlakyResultStore {
    pub fn new(inner: Arc<MemoryResultStore>) -> Self {
        Self {
            inner,
            remaining_failures: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_creates(&self, times: usize) {
        self.remaining_failures.store(times, Ordering::SeqCst);
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultStore for FlakyResultStore {
    async fn create(&self, result: &EvaluationResult) -> StoreResult<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(StoreError::Unavailable {
                message: "injected failure writing result".to_string(),
            });
        }
        self.inner.create(result).await
    }

    async fn find_by_job_id(&self, job_id: JobId) -> StoreResult<Option<EvaluationResult>> {
        self.inner.find_by_job_id(job_id).await
    }
}
