use std::time::Duration;

use super::error::{QueueError, QueueResult};

/// Default number of workers.
pub const DEFAULT_WORKER_COUNT: usize = 3;

/// Default buffer capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Default time `enqueue` waits for space.
pub const DEFAULT_ENQUEUE_TIMEOUT_SECS: u64 = 5;

/// Worker pool and buffer settings. Fixed for the lifetime of a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub worker_count: usize,
    pub capacity: usize,
    pub enqueue_timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            worker_count: DEFAULT_WORKER_COUNT,
            capacity: DEFAULT_QUEUE_CAPACITY,
            enqueue_timeout: Duration::from_secs(DEFAULT_ENQUEUE_TIMEOUT_SECS),
        }
    }
}

impl QueueConfig {
    pub fn validate(&self) -> QueueResult<()> {
        if self.worker_count == 0 {
            return Err(QueueError::InvalidConfig {
                reason: "worker_count must be greater than zero".to_string(),
            });
        }
        if self.capacity == 0 {
            return Err(QueueError::InvalidConfig {
                reason: "capacity must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
