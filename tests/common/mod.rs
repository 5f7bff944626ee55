//! Shared fixtures: a full in-process stack over mock collaborators.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use appraisal::domain::{Category, DocumentId, DocumentRole, FragmentMetadata, JobId, JobStatus};
use appraisal::extract::FileTextExtractor;
use appraisal::pipeline::{EvaluationPipeline, PipelineConfig};
use appraisal::queue::{JobQueue, QueueConfig};
use appraisal::retrieval::{HashEmbedder, VectorRetriever};
use appraisal::scoring::Scorer;
use appraisal::service::{EvaluationService, JobStatusView};
use appraisal::store::Stores;
use appraisal::vectordb::MockVectorDbClient;
use tempfile::TempDir;

pub const TEST_COLLECTION: &str = "appraisal_test_context";
pub const TEST_EMBEDDING_DIM: usize = 64;

pub const SUBJECT_TEXT: &str = "Backend engineer with five years of Rust and Go. \
Designed REST APIs, PostgreSQL schemas and message queues. \
Runs services on Kubernetes with Prometheus monitoring.";

pub const REFERENCE_TEXT: &str = "# Evaluation service\n\
The project exposes upload, evaluate and result endpoints. \
Jobs run on a bounded queue with retries and timeouts. \
Scores are validated before they are persisted.";

const CORPUS: &[(Category, &str, &str)] = &[
    (
        Category::Requirement,
        "job_description",
        "We need a backend engineer. Experience with Rust or Go is required. \
         You will design REST APIs and database schemas. Kubernetes experience is a plus.",
    ),
    (
        Category::SubjectRubric,
        "cv_rubric",
        "CV evaluation scoring criteria. Technical skills match carries the most weight. \
         Experience level and relevant achievements follow.",
    ),
    (
        Category::Brief,
        "case_study",
        "Build an evaluation service with upload, evaluate and result endpoints. \
         Long running work must run on a queue. Handle failures with retries.",
    ),
    (
        Category::ReferenceRubric,
        "project_rubric",
        "Project evaluation scoring criteria. Correctness, code quality, resilience \
         and documentation are each scored from one to five.",
    ),
];

pub struct TestStack {
    pub dir: TempDir,
    pub stores: Stores,
    pub queue: Arc<JobQueue>,
    pub service: Arc<EvaluationService>,
    pub vectordb: Arc<MockVectorDbClient>,
}

pub fn fast_pipeline_config() -> PipelineConfig {
    PipelineConfig {
        job_timeout: Duration::from_secs(5),
        persist_attempts: 3,
        collaborator_attempts: 1,
        retry_backoff: Duration::from_millis(5),
    }
}

/// Builds the stack with a seeded retrieval corpus. The queue is not started.
pub async fn build_stack(
    scorer: Arc<dyn Scorer>,
    queue_config: QueueConfig,
    pipeline_config: PipelineConfig,
) -> TestStack {
    let dir = tempfile::tempdir().expect("tempdir");
    let stores = Stores::in_memory();

    let vectordb = Arc::new(MockVectorDbClient::new());
    let retriever = VectorRetriever::new(
        Arc::new(HashEmbedder::new(TEST_EMBEDDING_DIM)),
        Arc::clone(&vectordb),
        TEST_COLLECTION,
    );
    retriever.ensure_collection().await.expect("ensure collection");
    for (category, source, text) in CORPUS {
        retriever
            .ingest(text, *category, FragmentMetadata::new().with_source(*source))
            .await
            .expect("ingest corpus");
    }

    let pipeline = EvaluationPipeline::new(
        stores.clone(),
        Arc::new(FileTextExtractor::new()),
        Arc::new(retriever),
        scorer,
    )
    .with_config(pipeline_config);

    let queue = Arc::new(JobQueue::new(queue_config, Arc::new(pipeline)).expect("queue config"));
    let service = Arc::new(EvaluationService::new(
        stores.clone(),
        Arc::clone(&queue),
        dir.path().join("uploads"),
    ));

    TestStack {
        dir,
        stores,
        queue,
        service,
        vectordb,
    }
}

pub async fn upload_documents(service: &EvaluationService) -> (DocumentId, DocumentId) {
    let subject = service
        .upload_document(DocumentRole::Subject, "cv.txt", SUBJECT_TEXT.as_bytes())
        .await
        .expect("upload subject");
    let reference = service
        .upload_document(DocumentRole::Reference, "report.md", REFERENCE_TEXT.as_bytes())
        .await
        .expect("upload reference");
    (subject.id, reference.id)
}

/// Polls until the job is terminal. Panics after five seconds.
pub async fn wait_for_terminal(service: &EvaluationService, job_id: JobId) -> JobStatusView {
    for _ in 0..500 {
        let view = service.get_status(job_id).await.expect("job exists");
        if view.job.status().is_terminal() {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} did not finish within 5s");
}

/// Polls until the job reaches `status`. Panics after five seconds.
pub async fn wait_for_status(service: &EvaluationService, job_id: JobId, status: JobStatus) {
    for _ in 0..500 {
        if service.get_status(job_id).await.expect("job exists").job.status() == status {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} never reached {status}");
}
