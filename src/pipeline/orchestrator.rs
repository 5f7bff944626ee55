use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

use super::config::PipelineConfig;
use super::error::{PipelineError, PipelineResult};
use super::retry::{Transient, retry_transient};
use super::text::truncate_chars;
use crate::constants::{
    BRIEF_TOP_K, QUERY_PREFIX_CHARS, REFERENCE_RUBRIC_QUERY, REFERENCE_RUBRIC_TOP_K,
    REQUIREMENT_TOP_K, SUBJECT_RUBRIC_QUERY, SUBJECT_RUBRIC_TOP_K,
};
use crate::domain::{
    Category, ContextFragment, Document, DocumentId, EvaluationJob, EvaluationResult, JobId,
    JobStatus,
};
use crate::extract::TextExtractor;
use crate::queue::JobProcessor;
use crate::retrieval::ContextRetriever;
use crate::scoring::{Scorer, ScoringError};
use crate::store::{StoreError, StoreResult, Stores};

/// Runs one job at a time from `Queued` to `Completed` or `Failed`.
pub struct EvaluationPipeline {
    stores: Stores,
    extractor: Arc<dyn TextExtractor>,
    retriever: Arc<dyn ContextRetriever>,
    scorer: Arc<dyn Scorer>,
    config: PipelineConfig,
}

impl EvaluationPipeline {
    pub fn new(
        stores: Stores,
        extractor: Arc<dyn TextExtractor>,
        retriever: Arc<dyn ContextRetriever>,
        scorer: Arc<dyn Scorer>,
    ) -> Self {
        Self {
            stores,
            extractor,
            retriever,
            scorer,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config.normalized();
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Evaluates one job.
    ///
    /// Refuses jobs that are not `Queued`. Once the job is `Processing`, every
    /// error is recorded on it as `Failed` before being returned.
    #[instrument(skip_all, fields(%job_id))]
    pub async fn process(&self, job_id: JobId) -> PipelineResult<()> {
        let mut job = self
            .stores
            .jobs
            .find_by_id(job_id)
            .await?
            .ok_or(PipelineError::JobNotFound { job_id })?;

        job.mark_processing()
            .map_err(|e| PipelineError::InvalidTransition {
                message: e.to_string(),
            })?;
        self.persist_with_retry("processing status", job_id, || {
            self.stores.jobs.update_if(&job, JobStatus::Queued)
        })
        .await?;

        let deadline = Instant::now() + self.config.job_timeout;
        info!(title = job.title(), "evaluation started");

        match self.run(&job, deadline).await {
            Ok(()) => self.complete(job).await,
            Err(err) => {
                self.fail(job, &err).await;
                Err(err)
            }
        }
    }

    /// Moves a job whose run was aborted (e.g. by a panic) to `Failed`.
    #[instrument(skip_all, fields(%job_id))]
    pub async fn abandon(&self, job_id: JobId, reason: &str) {
        let mut job = match self.stores.jobs.find_by_id(job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                warn!("abandoned job no longer exists");
                return;
            }
            Err(e) => {
                error!(error = %e, "could not load abandoned job");
                return;
            }
        };

        let expected = job.status();
        let transitioned = match expected {
            JobStatus::Queued => job.mark_processing().and_then(|()| job.mark_failed(reason)),
            JobStatus::Processing => job.mark_failed(reason),
            JobStatus::Completed | JobStatus::Failed => return,
        };
        if let Err(e) = transitioned {
            error!(error = %e, "could not fail abandoned job");
            return;
        }

        if let Err(e) = self
            .persist_with_retry("failed status", job_id, || {
                self.stores.jobs.update_if(&job, expected)
            })
            .await
        {
            error!(error = %e, "abandoned job stuck in processing");
        }
    }

    async fn run(&self, job: &EvaluationJob, deadline: Instant) -> PipelineResult<()> {
        let subject_doc = self
            .within(deadline, "load_subject", self.load_document(job.subject_id()))
            .await?;
        let reference_doc = self
            .within(deadline, "load_reference", self.load_document(job.reference_id()))
            .await?;

        let subject_text = self
            .within(deadline, "extract_subject", self.extract(&subject_doc, "subject"))
            .await?;
        let reference_text = self
            .within(
                deadline,
                "extract_reference",
                self.extract(&reference_doc, "reference"),
            )
            .await?;

        let requirement_query = format!(
            "{} {}",
            job.title(),
            truncate_chars(&subject_text, QUERY_PREFIX_CHARS)
        );
        let requirements = self
            .retrieve(
                deadline,
                &requirement_query,
                Category::Requirement,
                REQUIREMENT_TOP_K,
            )
            .await?;
        let subject_rubric = self
            .retrieve(
                deadline,
                SUBJECT_RUBRIC_QUERY,
                Category::SubjectRubric,
                SUBJECT_RUBRIC_TOP_K,
            )
            .await?;
        let brief = self
            .retrieve(
                deadline,
                truncate_chars(&reference_text, QUERY_PREFIX_CHARS),
                Category::Brief,
                BRIEF_TOP_K,
            )
            .await?;
        let reference_rubric = self
            .retrieve(
                deadline,
                REFERENCE_RUBRIC_QUERY,
                Category::ReferenceRubric,
                REFERENCE_RUBRIC_TOP_K,
            )
            .await?;

        let subject_eval = self
            .within(deadline, "score_subject", async {
                let eval = self
                    .retry("score_subject", |_| {
                        self.scorer
                            .score_subject(&subject_text, &requirements, &subject_rubric)
                    })
                    .await
                    .map_err(|e| scoring_error("score_subject", e))?;
                eval.validate()
                    .map_err(|source| PipelineError::InvalidScore {
                        step: "score_subject",
                        source,
                    })?;
                Ok(eval)
            })
            .await?;

        let reference_eval = self
            .within(deadline, "score_reference", async {
                let eval = self
                    .retry("score_reference", |_| {
                        self.scorer
                            .score_reference(&reference_text, &brief, &reference_rubric)
                    })
                    .await
                    .map_err(|e| scoring_error("score_reference", e))?;
                eval.validate()
                    .map_err(|source| PipelineError::InvalidScore {
                        step: "score_reference",
                        source,
                    })?;
                Ok(eval)
            })
            .await?;

        let summary = self
            .within(deadline, "synthesize", async {
                let summary = self
                    .retry("synthesize", |_| {
                        self.scorer.synthesize(&subject_eval, &reference_eval)
                    })
                    .await
                    .map_err(|source| PipelineError::SynthesisFailed { source })?;
                let summary = summary.trim();
                if summary.is_empty() {
                    return Err(PipelineError::SynthesisFailed {
                        source: ScoringError::EmptySummary,
                    });
                }
                Ok(summary.to_string())
            })
            .await?;

        debug!(
            match_rate = subject_eval.match_rate,
            reference_score = reference_eval.score,
            "scoring complete"
        );

        let result = EvaluationResult {
            job_id: job.id(),
            match_rate: subject_eval.match_rate,
            subject_feedback: subject_eval.feedback,
            reference_score: reference_eval.score,
            reference_feedback: reference_eval.feedback,
            overall_summary: summary,
            created_at: Utc::now(),
        };

        self.within(
            deadline,
            "persist_result",
            self.persist_with_retry("result", job.id(), || self.stores.results.create(&result)),
        )
        .await
    }

    /// Marks the job `Completed`. If that write is exhausted the job is
    /// recorded as `Failed` instead and its stored result is left orphaned.
    async fn complete(&self, job: EvaluationJob) -> PipelineResult<()> {
        let mut completed = job.clone();
        completed
            .mark_completed()
            .map_err(|e| PipelineError::InvalidTransition {
                message: e.to_string(),
            })?;

        match self
            .persist_with_retry("completed status", job.id(), || {
                self.stores.jobs.update_if(&completed, JobStatus::Processing)
            })
            .await
        {
            Ok(()) => {
                info!("evaluation completed");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "result stored but completed status not written");
                self.fail(job, &e).await;
                Err(e)
            }
        }
    }

    async fn fail(&self, mut job: EvaluationJob, err: &PipelineError) {
        warn!(error = %err, "evaluation failed");

        if let Err(e) = job.mark_failed(err.to_string()) {
            error!(error = %e, "could not mark job failed");
            return;
        }

        if let Err(e) = self
            .persist_with_retry("failed status", job.id(), || {
                self.stores.jobs.update_if(&job, JobStatus::Processing)
            })
            .await
        {
            error!(error = %e, "job stuck in processing");
        }
    }

    async fn load_document(&self, document_id: DocumentId) -> PipelineResult<Document> {
        self.stores
            .documents
            .find_by_id(document_id)
            .await?
            .ok_or(PipelineError::DocumentNotFound { document_id })
    }

    async fn extract(&self, document: &Document, side: &'static str) -> PipelineResult<String> {
        self.extractor
            .extract_text(document)
            .await
            .map_err(|source| PipelineError::ExtractionFailed {
                side,
                document_id: document.id,
                source,
            })
    }

    async fn retrieve(
        &self,
        deadline: Instant,
        query: &str,
        category: Category,
        top_k: usize,
    ) -> PipelineResult<Vec<ContextFragment>> {
        let step = retrieval_step(category);
        self.within(deadline, step, async {
            let fragments = self
                .retry(step, |_| self.retriever.search_similar(query, category, top_k))
                .await
                .map_err(|source| PipelineError::RetrievalFailed { category, source })?;

            let fragments: Vec<ContextFragment> = fragments
                .into_iter()
                .filter(|f| f.category == category)
                .take(top_k)
                .collect();
            debug!(%category, fragments = fragments.len(), "context retrieved");
            Ok(fragments)
        })
        .await
    }

    /// Fails with `Timeout` if `deadline` passes before `fut` resolves.
    async fn within<T>(
        &self,
        deadline: Instant,
        step: &'static str,
        fut: impl Future<Output = PipelineResult<T>>,
    ) -> PipelineResult<T> {
        let timeout = PipelineError::Timeout {
            step,
            timeout: self.config.job_timeout,
        };
        if Instant::now() >= deadline {
            return Err(timeout);
        }
        tokio::time::timeout_at(deadline, fut)
            .await
            .unwrap_or(Err(timeout))
    }

    async fn retry<T, E, F, Fut>(&self, step: &'static str, op: F) -> Result<T, E>
    where
        E: Transient + std::fmt::Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        retry_transient(
            step,
            self.config.collaborator_attempts,
            self.config.retry_backoff,
            op,
        )
        .await
        .map_err(|(e, _)| e)
    }

    /// Retries a store write; at least two attempts are always made.
    ///
    /// `AlreadyExists` after a failed attempt means that attempt landed.
    /// `Conflict` means another writer moved the job and is never retried.
    async fn persist_with_retry<F, Fut>(
        &self,
        what: &'static str,
        job_id: JobId,
        mut op: F,
    ) -> PipelineResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<()>>,
    {
        let attempts = self.config.persist_attempts;
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(()) => return Ok(()),
                Err(StoreError::AlreadyExists { .. }) if attempt > 1 => return Ok(()),
                Err(StoreError::Conflict {
                    expected, actual, ..
                }) => {
                    return Err(PipelineError::InvalidTransition {
                        message: format!("{what} write expected {expected}, job is {actual}"),
                    });
                }
                Err(e) if attempt < attempts => {
                    warn!(what, attempt, max_attempts = attempts, error = %e, "write failed, retrying");
                    tokio::time::sleep(self.config.retry_backoff * attempt).await;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(PipelineError::PersistenceFailed {
                        what,
                        job_id,
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }
}

fn scoring_error(step: &'static str, source: ScoringError) -> PipelineError {
    if source.is_invalid_output() {
        PipelineError::InvalidScore { step, source }
    } else {
        PipelineError::ScoringFailed { step, source }
    }
}

fn retrieval_step(category: Category) -> &'static str {
    match category {
        Category::Requirement => "retrieve_requirement",
        Category::SubjectRubric => "retrieve_subject_rubric",
        Category::Brief => "retrieve_brief",
        Category::ReferenceRubric => "retrieve_reference_rubric",
    }
}

#[async_trait]
impl JobProcessor for EvaluationPipeline {
    async fn process(&self, job_id: JobId) -> Result<(), PipelineError> {
        EvaluationPipeline::process(self, job_id).await
    }

    async fn abandon(&self, job_id: JobId, reason: &str) {
        EvaluationPipeline::abandon(self, job_id, reason).await
    }
}
