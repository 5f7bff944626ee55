use serde::Deserialize;

use super::parse::{parse_json_reply, strip_code_fence};
use super::prompts;
use super::*;
use crate::domain::{Category, ContextFragment};

#[derive(Debug, Deserialize, PartialEq)]
struct Reply {
    match_rate: f64,
    feedback: String,
}

fn fragments(category: Category, texts: &[&str]) -> Vec<ContextFragment> {
    texts
        .iter()
        .map(|t| ContextFragment::new(*t, category))
        .collect()
}

#[test]
fn test_subject_evaluation_range() {
    assert!(SubjectEvaluation::new(0.73, "").validate().is_ok());
    assert!(SubjectEvaluation::new(0.0, "").validate().is_ok());
    assert!(SubjectEvaluation::new(1.0, "").validate().is_ok());

    let err = SubjectEvaluation::new(1.5, "").validate().unwrap_err();
    assert_eq!(
        err,
        ScoringError::OutOfRange {
            field: "match_rate",
            value: 1.5,
            min: 0.0,
            max: 1.0
        }
    );
    assert!(SubjectEvaluation::new(-0.1, "").validate().is_err());
    assert!(SubjectEvaluation::new(f64::NAN, "").validate().is_err());
}

#[test]
fn test_reference_evaluation_range() {
    assert!(ReferenceEvaluation::new(1.0, "").validate().is_ok());
    assert!(ReferenceEvaluation::new(5.0, "").validate().is_ok());
    assert!(ReferenceEvaluation::new(0.9, "").validate().is_err());
    assert!(ReferenceEvaluation::new(5.01, "").validate().is_err());
    assert!(ReferenceEvaluation::new(f64::INFINITY, "").validate().is_err());
}

#[test]
fn test_error_classification() {
    assert!(ScoringError::Provider { message: "x".into() }.is_transient());
    assert!(!ScoringError::EmptySummary.is_transient());
    assert!(ScoringError::MalformedOutput { message: "x".into() }.is_invalid_output());
    assert!(!ScoringError::Provider { message: "x".into() }.is_invalid_output());
}

#[test]
fn test_parse_plain_json() {
    let reply: Reply = parse_json_reply(r#"{"match_rate": 0.7, "feedback": "ok"}"#).unwrap();
    assert_eq!(
        reply,
        Reply {
            match_rate: 0.7,
            feedback: "ok".into()
        }
    );
}

#[test]
fn test_parse_fenced_json_with_language_tag() {
    let raw = "```json\n{\"match_rate\": 0.4, \"feedback\": \"gaps\"}\n```";
    let reply: Reply = parse_json_reply(raw).unwrap();
    assert_eq!(reply.match_rate, 0.4);
}

#[test]
fn test_parse_json_with_leading_prose() {
    let raw = "Here is the evaluation:\n{\"match_rate\": 0.9, \"feedback\": \"great\"}\nThanks";
    let reply: Reply = parse_json_reply(raw).unwrap();
    assert_eq!(reply.feedback, "great");
}

#[test]
fn test_parse_rejects_non_json() {
    let err = parse_json_reply::<Reply>("I cannot evaluate this.").unwrap_err();
    assert!(matches!(err, ScoringError::MalformedOutput { .. }));

    let err = parse_json_reply::<Reply>(r#"{"feedback": "no rate"}"#).unwrap_err();
    assert!(matches!(err, ScoringError::MalformedOutput { .. }));
}

#[test]
fn test_strip_code_fence_variants() {
    assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
    assert_eq!(strip_code_fence("```{}```"), "{}");
    assert_eq!(strip_code_fence("  {}  "), "{}");
}

#[test]
fn test_prompts_include_context() {
    let reqs = fragments(Category::Requirement, &["Rust", "Postgres"]);
    let prompt = prompts::subject_prompt("cv body", &reqs, &[]);

    assert!(prompt.contains("- Rust"));
    assert!(prompt.contains("- Postgres"));
    assert!(prompt.contains("(none found)"));
    assert!(prompt.ends_with("cv body"));
}

#[tokio::test]
async fn test_keyword_scorer_coverage() {
    let scorer = KeywordScorer::new();
    let reqs = fragments(Category::Requirement, &["Rust", "Kubernetes"]);

    let eval = scorer
        .score_subject("Wrote tokio services in Rust", &reqs, &[])
        .await
        .unwrap();
    assert_eq!(eval.match_rate, 0.5);
    assert!(eval.validate().is_ok());

    let brief = fragments(Category::Brief, &["build queue workers"]);
    let reference = scorer
        .score_reference("The queue has workers", &brief, &[])
        .await
        .unwrap();
    assert!(reference.validate().is_ok());
    assert!(reference.score > 1.0);
}

#[tokio::test]
async fn test_keyword_scorer_without_context() {
    let scorer = KeywordScorer::new();
    let eval = scorer.score_subject("anything", &[], &[]).await.unwrap();
    assert_eq!(eval.match_rate, 0.0);

    let reference = scorer.score_reference("anything", &[], &[]).await.unwrap();
    assert_eq!(reference.score, 1.0);

    let summary = scorer.synthesize(&eval, &reference).await.unwrap();
    assert!(!summary.is_empty());
}

#[tokio::test]
async fn test_mock_scorer_provider_failures() {
    let scorer = MockScorer::default().with_provider_failures(1);

    let err = scorer.score_subject("", &[], &[]).await.unwrap_err();
    assert!(err.is_transient());
    assert!(scorer.score_subject("", &[], &[]).await.is_ok());
    assert_eq!(scorer.subject_calls(), 2);
}

#[test]
fn test_llm_scorer_sends_sampling_options() {
    let scorer = LlmScorer::new("gemini-2.0-flash");
    assert_eq!(scorer.temperature(), crate::constants::DEFAULT_LLM_TEMPERATURE);
    assert_eq!(scorer.max_tokens(), crate::constants::DEFAULT_LLM_MAX_TOKENS);

    let options = scorer.with_sampling(0.7, 256).chat_options();
    assert_eq!(options.temperature, Some(0.7));
    assert_eq!(options.max_tokens, Some(256));
}
