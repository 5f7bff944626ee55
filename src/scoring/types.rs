use serde::{Deserialize, Serialize};

use super::error::{ScoringError, ScoringResult};
use crate::constants::{MATCH_RATE_MAX, MATCH_RATE_MIN, REFERENCE_SCORE_MAX, REFERENCE_SCORE_MIN};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// How well the subject document matches the requirements.
pub struct SubjectEvaluation {
    /// Fraction of requirements met, `[0.0, 1.0]`.
    pub match_rate: f64,
    pub feedback: String,
}

impl SubjectEvaluation {
    pub fn new(match_rate: f64, feedback: impl Into<String>) -> Self {
        Self {
            match_rate,
            feedback: feedback.into(),
        }
    }

    /// Rejects NaN and values outside `[0.0, 1.0]`.
    pub fn validate(&self) -> ScoringResult<()> {
        check_range("match_rate", self.match_rate, MATCH_RATE_MIN, MATCH_RATE_MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Quality of the reference document against the brief.
pub struct ReferenceEvaluation {
    /// Rubric score, `[1.0, 5.0]`.
    pub score: f64,
    pub feedback: String,
}

impl ReferenceEvaluation {
    pub fn new(score: f64, feedback: impl Into<String>) -> Self {
        Self {
            score,
            feedback: feedback.into(),
        }
    }

    /// Rejects NaN and values outside `[1.0, 5.0]`.
    pub fn validate(&self) -> ScoringResult<()> {
        check_range(
            "reference_score",
            self.score,
            REFERENCE_SCORE_MIN,
            REFERENCE_SCORE_MAX,
        )
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> ScoringResult<()> {
    // NaN fails both comparisons, so test for containment rather than exclusion.
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ScoringError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
