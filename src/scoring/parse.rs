//! Lenient extraction of JSON objects from chat model replies.

use serde::de::DeserializeOwned;

use super::error::{ScoringError, ScoringResult};

/// Parses the first JSON object in `raw`.
///
/// Models often wrap JSON in Markdown fences or add a sentence before it, so
/// fences are stripped and parsing starts at the first `{` and ends at the
/// last `}`.
pub fn parse_json_reply<T: DeserializeOwned>(raw: &str) -> ScoringResult<T> {
    let body = strip_code_fence(raw);

    let (start, end) = match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => {
            return Err(ScoringError::MalformedOutput {
                message: format!("no JSON object in reply: {}", preview(raw)),
            });
        }
    };

    serde_json::from_str(&body[start..=end]).map_err(|e| ScoringError::MalformedOutput {
        message: format!("{e}: {}", preview(raw)),
    })
}

/// Removes a surrounding Markdown code fence, with or without a language tag.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    match rest.find('\n') {
        Some(newline) if !rest[..newline].trim_start().starts_with('{') => rest[newline + 1..].trim(),
        _ => rest.trim(),
    }
}

fn preview(raw: &str) -> String {
    const MAX: usize = 120;
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
