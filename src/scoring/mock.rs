use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::error::{ScoringError, ScoringResult};
use super::types::{ReferenceEvaluation, SubjectEvaluation};
use super::Scorer;
use crate::domain::ContextFragment;

/// Scorer returning fixed values, with optional delay and failures.
#[derive(Debug)]
pub struct MockScorer {
    match_rate: f64,
    reference_score: f64,
    summary: String,
    delay: Option<Duration>,
    subject_error: Option<ScoringError>,
    provider_failures: AtomicUsize,
    subject_calls: AtomicUsize,
}

impl Default for MockScorer {
    fn default() -> Self {
        Self::new(0.8, 4.0)
    }
}

impl MockScorer {
    pub fn new(match_rate: f64, reference_score: f64) -> Self {
        Self {
            match_rate,
            reference_score,
            summary: "Solid backend profile with a well-structured project.".to_string(),
            delay: None,
            subject_error: None,
            provider_failures: AtomicUsize::new(0),
            subject_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Every scorer call sleeps first.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// `score_subject` always fails with `error`.
    pub fn with_subject_error(mut self, error: ScoringError) -> Self {
        self.subject_error = Some(error);
        self
    }

    /// The next `times` `score_subject` calls fail with a provider error.
    pub fn with_provider_failures(self, times: usize) -> Self {
        self.provider_failures.store(times, Ordering::SeqCst);
        self
    }

    pub fn subject_calls(&self) -> usize {
        self.subject_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Scorer for MockScorer {
    async fn score_subject(
        &self,
        _subject_text: &str,
        _requirements: &[ContextFragment],
        _rubric: &[ContextFragment],
    ) -> ScoringResult<SubjectEvaluation> {
        self.subject_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        let provider_down = self
            .provider_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if provider_down {
            return Err(ScoringError::Provider {
                message: "503 service unavailable".to_string(),
            });
        }
        if let Some(error) = &self.subject_error {
            return Err(error.clone());
        }

        Ok(SubjectEvaluation::new(
            self.match_rate,
            "Meets most backend requirements.",
        ))
    }

    async fn score_reference(
        &self,
        _reference_text: &str,
        _brief: &[ContextFragment],
        _rubric: &[ContextFragment],
    ) -> ScoringResult<ReferenceEvaluation> {
        self.pause().await;
        Ok(ReferenceEvaluation::new(
            self.reference_score,
            "Clean architecture, light on tests.",
        ))
    }

    async fn synthesize(
        &self,
        _subject: &SubjectEvaluation,
        _reference: &ReferenceEvaluation,
    ) -> ScoringResult<String> {
        self.pause().await;
        Ok(self.summary.clone())
    }
}
