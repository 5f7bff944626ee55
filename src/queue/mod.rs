//! Bounded job queue drained by a fixed pool of workers.
//!
//! # Lifecycle
//!
//! ```text
//! new ──start──> running ──stop──> stopped
//!  │                                  ▲
//!  └──────────────stop────────────────┘
//! ```
//!
//! - `enqueue` works before `start` (jobs wait in the buffer) and fails with
//!   [`QueueError::Closed`] after `stop`.
//! - Workers check the cancellation token before taking each job, preferring
//!   it over a ready job. A job already handed to the processor runs to
//!   completion; `stop` waits for it.
//! - Each job runs in its own task so a panic is contained to that job. The
//!   processor's [`JobProcessor::abandon`] hook is called for it and the
//!   worker moves on.

pub mod config;
pub mod error;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub use config::QueueConfig;
pub use error::{QueueError, QueueResult};

use crate::domain::JobId;
use crate::pipeline::PipelineError;

/// What a worker does with a dequeued job.
#[async_trait]
pub trait JobProcessor: Send + Sync {
    /// Runs the job to a terminal state. Errors are already recorded on the job.
    async fn process(&self, job_id: JobId) -> Result<(), PipelineError>;

    /// Called when `process` panicked; must leave the job in a terminal state.
    async fn abandon(&self, job_id: JobId, reason: &str);
}

/// Bounded buffer of job ids plus the workers that drain it.
pub struct JobQueue {
    config: QueueConfig,
    sender: parking_lot::Mutex<Option<mpsc::Sender<JobId>>>,
    receiver: Arc<AsyncMutex<mpsc::Receiver<JobId>>>,
    processor: Arc<dyn JobProcessor>,
    cancel: CancellationToken,
    started: AtomicBool,
    stopped: AtomicBool,
    workers: AsyncMutex<Vec<JoinHandle<()>>>,
}

impl JobQueue {
    /// Creates a stopped-but-accepting queue. Call [`JobQueue::start`] to spawn workers.
    pub fn new(config: QueueConfig, processor: Arc<dyn JobProcessor>) -> QueueResult<Self> {
        config.validate()?;
        let (sender, receiver) = mpsc::channel(config.capacity);
        Ok(Self {
            config,
            sender: parking_lot::Mutex::new(Some(sender)),
            receiver: Arc::new(AsyncMutex::new(receiver)),
            processor,
            cancel: CancellationToken::new(),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            workers: AsyncMutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Jobs currently waiting in the buffer.
    pub fn len(&self) -> usize {
        self.sender
            .lock()
            .as_ref()
            .map(|s| s.max_capacity() - s.capacity())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `true` between `start` and `stop`.
    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::Acquire) && !self.stopped.load(Ordering::Acquire)
    }

    /// Places a job in the buffer, waiting up to the enqueue timeout for space.
    ///
    /// The job's status is not touched. On [`QueueError::QueueFull`] nothing was
    /// added to the buffer.
    pub async fn enqueue(&self, job_id: JobId) -> QueueResult<()> {
        let sender = self
            .sender
            .lock()
            .clone()
            .ok_or(QueueError::Closed { job_id })?;

        match sender.send_timeout(job_id, self.config.enqueue_timeout).await {
            Ok(()) => {
                debug!(%job_id, "job enqueued");
                Ok(())
            }
            Err(mpsc::error::SendTimeoutError::Timeout(_)) => {
                warn!(%job_id, timeout = ?self.config.enqueue_timeout, "queue full");
                Err(QueueError::QueueFull {
                    job_id,
                    timeout: self.config.enqueue_timeout,
                })
            }
            Err(mpsc::error::SendTimeoutError::Closed(_)) => Err(QueueError::Closed { job_id }),
        }
    }

    /// Spawns exactly `worker_count` workers.
    pub async fn start(&self) -> QueueResult<()> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(QueueError::Stopped);
        }
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(QueueError::AlreadyStarted);
        }

        let mut workers = self.workers.lock().await;
        for worker in 0..self.config.worker_count {
            let receiver = Arc::clone(&self.receiver);
            let processor = Arc::clone(&self.processor);
            let cancel = self.cancel.clone();
            workers.push(tokio::spawn(worker_loop(worker, receiver, processor, cancel)));
        }

        info!(workers = self.config.worker_count, capacity = self.config.capacity, "job queue started");
        Ok(())
    }

    /// Cancels workers, closes the buffer and waits for in-flight jobs.
    ///
    /// Safe to call more than once and from several tasks; every call returns
    /// only after all workers have exited.
    pub async fn stop(&self) {
        let first = !self.stopped.swap(true, Ordering::AcqRel);
        if first {
            info!("stopping job queue");
        }

        self.cancel.cancel();
        self.sender.lock().take();

        let mut workers = self.workers.lock().await;
        let handles: Vec<JoinHandle<()>> = workers.drain(..).collect();
        for result in join_all(handles).await {
            if let Err(e) = result {
                error!("worker task ended abnormally: {}", e);
            }
        }

        if first {
            info!("job queue stopped");
        }
    }
}

impl Drop for JobQueue {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn worker_loop(
    worker: usize,
    receiver: Arc<AsyncMutex<mpsc::Receiver<JobId>>>,
    processor: Arc<dyn JobProcessor>,
    cancel: CancellationToken,
) {
    debug!(worker, "worker started");

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            job = async { receiver.lock().await.recv().await } => job,
        };

        let Some(job_id) = next else {
            break;
        };

        run_job(worker, job_id, &processor).await;
    }

    debug!(worker, "worker exited");
}

async fn run_job(worker: usize, job_id: JobId, processor: &Arc<dyn JobProcessor>) {
    let task = {
        let processor = Arc::clone(processor);
        tokio::spawn(async move { processor.process(job_id).await })
    };

    match task.await {
        Ok(Ok(())) => debug!(worker, %job_id, "job finished"),
        Ok(Err(e)) => warn!(worker, %job_id, error = %e, "job failed"),
        Err(e) => {
            error!(worker, %job_id, "job task aborted: {}", e);
            processor
                .abandon(job_id, "evaluation aborted unexpectedly")
                .await;
        }
    }
}
