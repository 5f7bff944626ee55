//! Cross-cutting, shared constants.
//!
//! Retrieval shapes (query prefix length, top-K per category) are fixed by the
//! pipeline; everything tunable at runtime lives in [`crate::config::Config`].

/// Characters of document text folded into a retrieval query.
pub const QUERY_PREFIX_CHARS: usize = 500;

/// Fragments retrieved from the requirement corpus for the subject document.
pub const REQUIREMENT_TOP_K: usize = 5;

/// Fragments retrieved from the subject scoring rubric.
pub const SUBJECT_RUBRIC_TOP_K: usize = 3;

/// Fragments retrieved from the project brief corpus for the reference document.
pub const BRIEF_TOP_K: usize = 5;

/// Fragments retrieved from the reference scoring rubric.
pub const REFERENCE_RUBRIC_TOP_K: usize = 3;

/// Canonical query for the subject rubric category.
pub const SUBJECT_RUBRIC_QUERY: &str = "CV evaluation scoring criteria";

/// Canonical query for the reference rubric category.
pub const REFERENCE_RUBRIC_QUERY: &str = "Project evaluation scoring criteria";

pub const MATCH_RATE_MIN: f64 = 0.0;
pub const MATCH_RATE_MAX: f64 = 1.0;
pub const REFERENCE_SCORE_MIN: f64 = 1.0;
pub const REFERENCE_SCORE_MAX: f64 = 5.0;

/// Sampling temperature for scoring calls. Low, so repeated runs agree.
pub const DEFAULT_LLM_TEMPERATURE: f64 = 0.2;

/// Upper bound on tokens in one model reply.
pub const DEFAULT_LLM_MAX_TOKENS: u32 = 1024;

/// Default embedding dimension (matches `nomic-embed-text`).
pub const DEFAULT_EMBEDDING_DIM: usize = 768;

/// Maximum characters per ingested chunk.
pub const DEFAULT_CHUNK_CHARS: usize = 1000;

/// Upper bound on pending jobs re-enqueued at startup.
pub const DEFAULT_REQUEUE_LIMIT: usize = 1000;
