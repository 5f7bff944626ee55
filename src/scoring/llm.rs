use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use serde::Deserialize;
use tracing::{debug, error};

use super::error::{ScoringError, ScoringResult};
use super::parse::parse_json_reply;
use super::prompts;
use super::types::{ReferenceEvaluation, SubjectEvaluation};
use super::Scorer;
use crate::constants::{DEFAULT_LLM_MAX_TOKENS, DEFAULT_LLM_TEMPERATURE};
use crate::domain::ContextFragment;

/// Scorer backed by a chat model through `genai`.
///
/// Provider credentials come from the environment variables `genai` reads
/// for the chosen model (e.g. `GEMINI_API_KEY`, `OPENAI_API_KEY`).
#[derive(Clone)]
pub struct LlmScorer {
    client: Client,
    model: String,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct SubjectReply {
    match_rate: f64,
    #[serde(default)]
    feedback: String,
}

#[derive(Deserialize)]
struct ReferenceReply {
    score: f64,
    #[serde(default)]
    feedback: String,
}

impl LlmScorer {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_client(Client::default(), model)
    }

    pub fn with_client(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: DEFAULT_LLM_TEMPERATURE,
            max_tokens: DEFAULT_LLM_MAX_TOKENS,
        }
    }

    /// Sets the sampling temperature and reply token limit sent with every call.
    pub fn with_sampling(mut self, temperature: f64, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub(crate) fn chat_options(&self) -> ChatOptions {
        ChatOptions::default()
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
    }

    async fn complete(&self, system: &str, user: String) -> ScoringResult<String> {
        let request = ChatRequest::new(vec![ChatMessage::system(system), ChatMessage::user(user)]);

        let options = self.chat_options();

        let response = self
            .client
            .exec_chat(&self.model, request, Some(&options))
            .await
            .map_err(|e| {
                error!(model = %self.model, "provider error: {}", e);
                ScoringError::Provider {
                    message: e.to_string(),
                }
            })?;

        let text = response.first_text().unwrap_or_default().to_string();
        debug!(model = %self.model, chars = text.len(), "model reply");
        Ok(text)
    }
}

#[async_trait]
impl Scorer for LlmScorer {
    async fn score_subject(
        &self,
        subject_text: &str,
        requirements: &[ContextFragment],
        rubric: &[ContextFragment],
    ) -> ScoringResult<SubjectEvaluation> {
        let reply = self
            .complete(
                prompts::SUBJECT_SYSTEM,
                prompts::subject_prompt(subject_text, requirements, rubric),
            )
            .await?;
        let parsed: SubjectReply = parse_json_reply(&reply)?;
        Ok(SubjectEvaluation::new(parsed.match_rate, parsed.feedback.trim()))
    }

    async fn score_reference(
        &self,
        reference_text: &str,
        brief: &[ContextFragment],
        rubric: &[ContextFragment],
    ) -> ScoringResult<ReferenceEvaluation> {
        let reply = self
            .complete(
                prompts::REFERENCE_SYSTEM,
                prompts::reference_prompt(reference_text, brief, rubric),
            )
            .await?;
        let parsed: ReferenceReply = parse_json_reply(&reply)?;
        Ok(ReferenceEvaluation::new(parsed.score, parsed.feedback.trim()))
    }

    async fn synthesize(
        &self,
        subject: &SubjectEvaluation,
        reference: &ReferenceEvaluation,
    ) -> ScoringResult<String> {
        let reply = self
            .complete(
                prompts::SUMMARY_SYSTEM,
                prompts::summary_prompt(subject, reference),
            )
            .await?;
        let summary = reply.trim().to_string();
        if summary.is_empty() {
            return Err(ScoringError::EmptySummary);
        }
        Ok(summary)
    }
}
