use std::time::Duration;

/// Default per-job deadline.
pub const DEFAULT_JOB_TIMEOUT_SECS: u64 = 300;

/// Default total attempts for result and terminal-status writes.
pub const DEFAULT_PERSIST_ATTEMPTS: u32 = 3;

/// Fewest write attempts allowed (one try plus one retry).
pub const MIN_PERSIST_ATTEMPTS: u32 = 2;

pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 200;

/// Timing and retry policy for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Deadline measured from the moment the job is marked `Processing`.
    pub job_timeout: Duration,
    /// Total attempts for store writes; clamped to at least two.
    pub persist_attempts: u32,
    /// Total attempts for transient retriever/scorer failures; `1` disables retries.
    pub collaborator_attempts: u32,
    /// Linear backoff unit between attempts.
    pub retry_backoff: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            job_timeout: Duration::from_secs(DEFAULT_JOB_TIMEOUT_SECS),
            persist_attempts: DEFAULT_PERSIST_ATTEMPTS,
            collaborator_attempts: 1,
            retry_backoff: Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        }
    }
}

impl PipelineConfig {
    /// Raises attempt counts to their minimums.
    pub fn normalized(mut self) -> Self {
        self.persist_attempts = self.persist_attempts.max(MIN_PERSIST_ATTEMPTS);
        self.collaborator_attempts = self.collaborator_attempts.max(1);
        self
    }
}
