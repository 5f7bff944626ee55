//! Scoring of subject and reference documents against retrieved context.
//!
//! A [`Scorer`] produces a [`SubjectEvaluation`] (match rate in `[0, 1]`), a
//! [`ReferenceEvaluation`] (score in `[1, 5]`) and a closing summary.
//!
//! # Output Contract
//!
//! Implementations return whatever the model produced; range checks live in
//! [`SubjectEvaluation::validate`] and [`ReferenceEvaluation::validate`] and
//! are applied by the pipeline no matter which scorer is plugged in. Output
//! that cannot be parsed at all is a [`ScoringError::MalformedOutput`].
//!
//! [`LlmScorer`] talks to a chat model through `genai`. [`KeywordScorer`] is
//! a deterministic offline stand-in for local runs.

pub mod error;
pub mod keyword;
pub mod llm;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod parse;
pub mod prompts;
pub mod types;

#[cfg(test)]
mod tests;

use async_trait::async_trait;

pub use error::{ScoringError, ScoringResult};
pub use keyword::KeywordScorer;
pub use llm::LlmScorer;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockScorer;
pub use types::{ReferenceEvaluation, SubjectEvaluation};

use crate::domain::ContextFragment;

/// Structured evaluation of documents against context.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Scores the subject text against requirement and rubric fragments.
    async fn score_subject(
        &self,
        subject_text: &str,
        requirements: &[ContextFragment],
        rubric: &[ContextFragment],
    ) -> ScoringResult<SubjectEvaluation>;

    /// Scores the reference text against brief and rubric fragments.
    async fn score_reference(
        &self,
        reference_text: &str,
        brief: &[ContextFragment],
        rubric: &[ContextFragment],
    ) -> ScoringResult<ReferenceEvaluation>;

    /// Combines both evaluations into a short narrative.
    async fn synthesize(
        &self,
        subject: &SubjectEvaluation,
        reference: &ReferenceEvaluation,
    ) -> ScoringResult<String>;
}
