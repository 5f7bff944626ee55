use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::JobId;

/// Final scores and narrative for a completed job. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub job_id: JobId,
    /// Subject-versus-requirements match, in `[0.0, 1.0]`.
    pub match_rate: f64,
    pub subject_feedback: String,
    /// Reference-document score, in `[1.0, 5.0]`.
    pub reference_score: f64,
    pub reference_feedback: String,
    pub overall_summary: String,
    pub created_at: DateTime<Utc>,
}
