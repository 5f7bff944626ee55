use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::retrieval::RetrievalError;
use crate::scoring::ScoringError;

/// Errors that know whether a retry could help.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for RetrievalError {
    fn is_transient(&self) -> bool {
        RetrievalError::is_transient(self)
    }
}

impl Transient for ScoringError {
    fn is_transient(&self) -> bool {
        ScoringError::is_transient(self)
    }
}

/// Runs `op` up to `attempts` times, retrying only transient errors.
///
/// Sleeps `backoff * attempt` between tries. Returns the last error and the
/// number of attempts made.
pub async fn retry_transient<T, E, F, Fut>(
    step: &'static str,
    attempts: u32,
    backoff: Duration,
    mut op: F,
) -> Result<T, (E, u32)>
where
    E: Transient + std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts && e.is_transient() => {
                warn!(step, attempt, max_attempts = attempts, error = %e, "transient failure, retrying");
                tokio::time::sleep(backoff * attempt).await;
                attempt += 1;
            }
            Err(e) => return Err((e, attempt)),
        }
    }
}
