//! Prompt text for the LLM scorer.

use crate::domain::ContextFragment;

use super::types::{ReferenceEvaluation, SubjectEvaluation};

pub const SUBJECT_SYSTEM: &str = "You are an experienced technical recruiter. \
Compare the candidate's CV with the job requirements and the scoring rubric. \
Reply with JSON only: {\"match_rate\": <number between 0 and 1>, \"feedback\": \"<2-3 sentences>\"}.";

pub const REFERENCE_SYSTEM: &str = "You are a senior engineer reviewing a take-home project. \
Compare the project report with the case study brief and the scoring rubric. \
Reply with JSON only: {\"score\": <number between 1 and 5>, \"feedback\": \"<2-3 sentences>\"}.";

pub const SUMMARY_SYSTEM: &str = "You write hiring summaries. \
Given a CV evaluation and a project evaluation, write 3-5 sentences covering strengths, \
gaps and a recommendation. Reply with plain text only.";

pub fn subject_prompt(
    subject_text: &str,
    requirements: &[ContextFragment],
    rubric: &[ContextFragment],
) -> String {
    format!(
        "JOB REQUIREMENTS:\n{}\n\nSCORING RUBRIC:\n{}\n\nCANDIDATE CV:\n{}",
        join_fragments(requirements),
        join_fragments(rubric),
        subject_text
    )
}

pub fn reference_prompt(
    reference_text: &str,
    brief: &[ContextFragment],
    rubric: &[ContextFragment],
) -> String {
    format!(
        "CASE STUDY BRIEF:\n{}\n\nSCORING RUBRIC:\n{}\n\nPROJECT REPORT:\n{}",
        join_fragments(brief),
        join_fragments(rubric),
        reference_text
    )
}

pub fn summary_prompt(subject: &SubjectEvaluation, reference: &ReferenceEvaluation) -> String {
    format!(
        "CV match rate: {:.2}\nCV feedback: {}\n\nProject score: {:.1}/5\nProject feedback: {}",
        subject.match_rate, subject.feedback, reference.score, reference.feedback
    )
}

fn join_fragments(fragments: &[ContextFragment]) -> String {
    if fragments.is_empty() {
        return "(none found)".to_string();
    }
    fragments
        .iter()
        .map(|f| format!("- {}", f.content))
        .collect::<Vec<_>>()
        .join("\n")
}
