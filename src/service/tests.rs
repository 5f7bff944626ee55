use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tempfile::TempDir;

use super::*;
use crate::domain::{DocumentRole, EvaluationResult, JobId, JobStatus};
use crate::pipeline::PipelineError;
use crate::queue::{JobProcessor, QueueConfig};

struct NoopProcessor;

#[async_trait]
impl JobProcessor for NoopProcessor {
    async fn process(&self, _job_id: JobId) -> Result<(), PipelineError> {
        Ok(())
    }

    async fn abandon(&self, _job_id: JobId, _reason: &str) {}
}

struct Harness {
    _dir: TempDir,
    stores: Stores,
    service: EvaluationService,
}

/// A service over an unstarted queue, so enqueued ids stay in the buffer.
fn harness(capacity: usize) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let stores = Stores::in_memory();
    let queue = JobQueue::new(
        QueueConfig {
            worker_count: 1,
            capacity,
            enqueue_timeout: Duration::from_millis(20),
        },
        Arc::new(NoopProcessor),
    )
    .unwrap();
    let service = EvaluationService::new(stores.clone(), Arc::new(queue), dir.path().join("uploads"));
    Harness {
        _dir: dir,
        stores,
        service,
    }
}

async fn upload_pair(service: &EvaluationService) -> (DocumentId, DocumentId) {
    let subject = service
        .upload_document(DocumentRole::Subject, "cv.txt", b"Rust engineer.")
        .await
        .unwrap();
    let reference = service
        .upload_document(DocumentRole::Reference, "report.md", b"# Project\nA queue.")
        .await
        .unwrap();
    (subject.id, reference.id)
}

#[tokio::test]
async fn test_create_job_is_queued() {
    let h = harness(4);
    let (subject, reference) = upload_pair(&h.service).await;

    let job = h
        .service
        .create_job("  Backend Engineer ", subject, reference)
        .await
        .unwrap();

    assert_eq!(job.status(), JobStatus::Queued);
    assert_eq!(job.title(), "Backend Engineer");
    assert!(h.stores.jobs.find_by_id(job.id()).await.unwrap().is_some());
    assert!(h.service.queue().is_empty());
}

#[tokio::test]
async fn test_blank_title_rejected() {
    let h = harness(4);
    let (subject, reference) = upload_pair(&h.service).await;

    let err = h.service.create_job("   ", subject, reference).await.unwrap_err();
    assert!(matches!(err, SubmissionError::InvalidInput { .. }));
}

#[tokio::test]
async fn test_missing_document_creates_nothing() {
    let h = harness(4);
    let (subject, _) = upload_pair(&h.service).await;
    let missing = DocumentId::new();

    let err = h.service.submit("Backend Engineer", subject, missing).await.unwrap_err();

    assert!(matches!(err, SubmissionError::DocumentNotFound { document_id } if document_id == missing));
    assert!(h.stores.jobs.find_pending(10).await.unwrap().is_empty());
    assert!(h.service.queue().is_empty());
}

#[tokio::test]
async fn test_submit_enqueues_job() {
    let h = harness(4);
    let (subject, reference) = upload_pair(&h.service).await;

    h.service.submit("Backend Engineer", subject, reference).await.unwrap();

    assert_eq!(h.service.queue().len(), 1);
}

#[tokio::test]
async fn test_queue_full_fails_rejected_job() {
    let h = harness(1);
    let (subject, reference) = upload_pair(&h.service).await;

    h.service.submit("first", subject, reference).await.unwrap();
    let err = h.service.submit("second", subject, reference).await.unwrap_err();

    let SubmissionError::QueueFull { job_id, .. } = err else {
        panic!("expected QueueFull, got {err:?}");
    };
    let job = h.stores.jobs.find_by_id(job_id).await.unwrap().unwrap();
    assert_eq!(job.status(), JobStatus::Failed);
    assert!(job.error_message().unwrap().contains("queue full"));
    assert_eq!(h.service.queue().len(), 1);

    h.service.queue().start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let pending = h.stores.jobs.find_pending(10).await.unwrap();
    assert!(pending.iter().all(|job| job.id() != job_id));
    h.service.queue().stop().await;
}

#[tokio::test]
async fn test_submit_after_stop_is_shutting_down() {
    let h = harness(4);
    let (subject, reference) = upload_pair(&h.service).await;
    h.service.queue().stop().await;

    let err = h.service.submit("late", subject, reference).await.unwrap_err();
    let SubmissionError::ShuttingDown { job_id } = err else {
        panic!("expected ShuttingDown, got {err:?}");
    };
    let job = h.service.get_status(job_id).await.unwrap().job;
    assert_eq!(job.status(), JobStatus::Failed);
    assert!(job.error_message().unwrap().contains("shutting down"));
}

#[tokio::test]
async fn test_get_status_hides_result_until_completed() {
    let h = harness(4);
    let (subject, reference) = upload_pair(&h.service).await;
    let mut job = h.service.create_job("Backend Engineer", subject, reference).await.unwrap();

    let view = h.service.get_status(job.id()).await.unwrap();
    assert_eq!(view.job.status(), JobStatus::Queued);
    assert!(view.result.is_none());

    job.mark_processing().unwrap();
    job.mark_completed().unwrap();
    h.stores.jobs.update(&job).await.unwrap();
    h.stores
        .results
        .create(&EvaluationResult {
            job_id: job.id(),
            match_rate: 0.8,
            subject_feedback: "good".to_string(),
            reference_score: 4.0,
            reference_feedback: "solid".to_string(),
            overall_summary: "hire".to_string(),
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let view = h.service.get_status(job.id()).await.unwrap();
    assert_eq!(view.job.status(), JobStatus::Completed);
    assert_eq!(view.result.unwrap().match_rate, 0.8);
}

#[tokio::test]
async fn test_get_status_unknown_job() {
    let h = harness(4);
    let err = h.service.get_status(JobId::new()).await.unwrap_err();
    assert!(matches!(err, SubmissionError::JobNotFound { .. }));
}

#[tokio::test]
async fn test_requeue_pending_respects_limit() {
    let h = harness(10);
    let (subject, reference) = upload_pair(&h.service).await;
    for i in 0..3 {
        h.service
            .create_job(&format!("job {i}"), subject, reference)
            .await
            .unwrap();
    }

    assert_eq!(h.service.requeue_pending(2).await.unwrap(), 2);
    assert_eq!(h.service.queue().len(), 2);
}

#[tokio::test]
async fn test_requeue_pending_stops_when_full() {
    let h = harness(2);
    let (subject, reference) = upload_pair(&h.service).await;
    for i in 0..3 {
        h.service
            .create_job(&format!("job {i}"), subject, reference)
            .await
            .unwrap();
    }

    assert_eq!(h.service.requeue_pending(10).await.unwrap(), 2);
    assert_eq!(h.stores.jobs.find_pending(10).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_upload_writes_file_and_registers_document() {
    let h = harness(4);

    let document = h
        .service
        .upload_document(DocumentRole::Reference, "../../notes.md", b"# Notes")
        .await
        .unwrap();

    assert_eq!(document.filename, "notes.md");
    assert_eq!(document.mime_type, "text/markdown");
    assert_eq!(document.size_bytes, 7);
    assert!(document.file_path.starts_with(h.service.upload_dir()));
    assert_eq!(tokio::fs::read(&document.file_path).await.unwrap(), b"# Notes");
    assert!(h.stores.documents.find_by_id(document.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_upload_rejects_empty_body() {
    let h = harness(4);
    let err = h
        .service
        .upload_document(DocumentRole::Subject, "cv.txt", b"")
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::InvalidInput { .. }));
}
