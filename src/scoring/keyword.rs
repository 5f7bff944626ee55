use std::collections::BTreeSet;

use async_trait::async_trait;

use super::error::ScoringResult;
use super::types::{ReferenceEvaluation, SubjectEvaluation};
use super::Scorer;
use crate::domain::ContextFragment;

/// Offline scorer based on term coverage.
///
/// The match rate is the share of distinct context terms (four or more
/// alphanumeric characters) that also appear in the document. The reference
/// score maps the same coverage onto `[1, 5]`. Rubric fragments are not used.
#[derive(Debug, Clone, Default)]
pub struct KeywordScorer;

impl KeywordScorer {
    pub fn new() -> Self {
        Self
    }

    fn coverage(text: &str, context: &[ContextFragment]) -> (usize, usize) {
        let wanted: BTreeSet<String> = context.iter().flat_map(|f| terms(&f.content)).collect();
        if wanted.is_empty() {
            return (0, 0);
        }
        let have: BTreeSet<String> = terms(text).collect();
        (wanted.intersection(&have).count(), wanted.len())
    }
}

fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 4)
        .map(str::to_lowercase)
}

fn ratio(hit: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        ((hit as f64 / total as f64) * 100.0).round() / 100.0
    }
}

#[async_trait]
impl Scorer for KeywordScorer {
    async fn score_subject(
        &self,
        subject_text: &str,
        requirements: &[ContextFragment],
        _rubric: &[ContextFragment],
    ) -> ScoringResult<SubjectEvaluation> {
        let (hit, total) = Self::coverage(subject_text, requirements);
        Ok(SubjectEvaluation::new(
            ratio(hit, total),
            format!("Matched {hit} of {total} requirement terms."),
        ))
    }

    async fn score_reference(
        &self,
        reference_text: &str,
        brief: &[ContextFragment],
        _rubric: &[ContextFragment],
    ) -> ScoringResult<ReferenceEvaluation> {
        let (hit, total) = Self::coverage(reference_text, brief);
        let score = 1.0 + 4.0 * ratio(hit, total);
        Ok(ReferenceEvaluation::new(
            (score * 10.0).round() / 10.0,
            format!("Covered {hit} of {total} brief terms."),
        ))
    }

    async fn synthesize(
        &self,
        subject: &SubjectEvaluation,
        reference: &ReferenceEvaluation,
    ) -> ScoringResult<String> {
        let verdict = match (subject.match_rate >= 0.6, reference.score >= 3.5) {
            (true, true) => "Strong fit on both the profile and the project.",
            (true, false) => "Profile fits, but the project falls short of the brief.",
            (false, true) => "Project is solid, but the profile misses key requirements.",
            (false, false) => "Neither the profile nor the project meets the bar.",
        };
        Ok(format!(
            "CV match rate {:.2}; project score {:.1}/5. {}",
            subject.match_rate, reference.score, verdict
        ))
    }
}
