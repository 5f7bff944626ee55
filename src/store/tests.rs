use std::sync::Arc;

use chrono::Utc;

use super::*;
use crate::domain::{
    Document, DocumentId, DocumentRole, EvaluationJob, EvaluationResult, JobId, JobStatus,
};

fn job() -> EvaluationJob {
    EvaluationJob::new("Backend Engineer", DocumentId::new(), DocumentId::new())
}

fn result_for(job_id: JobId) -> EvaluationResult {
    EvaluationResult {
        job_id,
        match_rate: 0.8,
        subject_feedback: "solid".to_string(),
        reference_score: 4.0,
        reference_feedback: "clean".to_string(),
        overall_summary: "hire".to_string(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_job_create_and_find() {
    let store = MemoryJobStore::new();
    let job = job();

    store.create(&job).await.unwrap();

    let found = store.find_by_id(job.id()).await.unwrap();
    assert_eq!(found, Some(job));
    assert_eq!(store.find_by_id(JobId::new()).await.unwrap(), None);
}

#[tokio::test]
async fn test_job_create_twice_is_rejected() {
    let store = MemoryJobStore::new();
    let job = job();
    store.create(&job).await.unwrap();

    let err = store.create(&job).await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists { kind: "job", .. }));
}

#[tokio::test]
async fn test_job_update_requires_existing_record() {
    let store = MemoryJobStore::new();
    let job = job();

    let err = store.update(&job).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { kind: "job", .. }));
}

#[tokio::test]
async fn test_job_update_replaces_record() {
    let store = MemoryJobStore::new();
    let mut job = job();
    store.create(&job).await.unwrap();

    job.mark_processing().unwrap();
    store.update(&job).await.unwrap();

    let found = store.find_by_id(job.id()).await.unwrap().unwrap();
    assert_eq!(found.status(), JobStatus::Processing);
}

#[tokio::test]
async fn test_update_if_only_one_claim_wins() {
    let store = MemoryJobStore::new();
    let job = job();
    store.create(&job).await.unwrap();

    let mut first = job.clone();
    let mut second = job.clone();
    first.mark_processing().unwrap();
    second.mark_processing().unwrap();

    store.update_if(&first, JobStatus::Queued).await.unwrap();
    let err = store.update_if(&second, JobStatus::Queued).await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Conflict {
            expected: JobStatus::Queued,
            actual: JobStatus::Processing,
            ..
        }
    ));
}

#[tokio::test]
async fn test_update_if_requires_existing_record() {
    let store = MemoryJobStore::new();
    let job = job();

    let err = store.update_if(&job, JobStatus::Queued).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { kind: "job", .. }));
}

#[tokio::test]
async fn test_find_pending_returns_only_queued_oldest_first() {
    let store = MemoryJobStore::new();
    let first = job();
    let second = job();
    let mut running = job();
    running.mark_processing().unwrap();

    store.create(&first).await.unwrap();
    store.create(&second).await.unwrap();
    store.create(&running).await.unwrap();

    let pending = store.find_pending(10).await.unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending[0].created_at() <= pending[1].created_at());
    assert!(pending.iter().all(|j| j.status() == JobStatus::Queued));

    assert_eq!(store.find_pending(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_result_is_one_per_job() {
    let store = MemoryResultStore::new();
    let job_id = JobId::new();

    store.create(&result_for(job_id)).await.unwrap();
    let err = store.create(&result_for(job_id)).await.unwrap_err();

    assert!(matches!(err, StoreError::AlreadyExists { kind: "result", .. }));
    assert_eq!(store.len(), 1);
    assert_eq!(
        store.find_by_job_id(job_id).await.unwrap().unwrap().match_rate,
        0.8
    );
}

#[tokio::test]
async fn test_document_store_roundtrip() {
    let store = MemoryDocumentStore::new();
    let doc = Document::new(DocumentRole::Subject, "cv.txt", "/tmp/cv.txt", 10, "text/plain");

    store.create(&doc).await.unwrap();

    assert_eq!(store.find_by_id(doc.id).await.unwrap(), Some(doc));
    assert_eq!(store.find_by_id(DocumentId::new()).await.unwrap(), None);
}

#[tokio::test]
async fn test_flaky_job_store_fails_only_targeted_status() {
    let store = FlakyJobStore::new(Arc::new(MemoryJobStore::new()));
    let mut job = job();
    store.create(&job).await.unwrap();
    store.fail_updates_to(JobStatus::Completed, 1);

    job.mark_processing().unwrap();
    store.update(&job).await.unwrap();

    job.mark_completed().unwrap();
    let err = store.update(&job).await.unwrap_err();
    assert!(err.is_transient());
    store.update(&job).await.unwrap();

    assert_eq!(store.update_calls(), 3);
}

#[tokio::test]
async fn test_flaky_result_store_fails_then_succeeds() {
    let store = FlakyResultStore::new(Arc::new(MemoryResultStore::new()));
    store.fail_creates(1);
    let job_id = JobId::new();

    assert!(store.create(&result_for(job_id)).await.is_err());
    store.create(&result_for(job_id)).await.unwrap();
    assert_eq!(store.create_calls(), 2);
}
