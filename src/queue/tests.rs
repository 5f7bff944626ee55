use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::*;
use crate::domain::JobId;
use crate::pipeline::PipelineError;

#[derive(Default)]
struct RecordingProcessor {
    delay: Duration,
    panic_on: Option<JobId>,
    started: AtomicUsize,
    in_flight: Mutex<HashSet<JobId>>,
    double_owned: AtomicBool,
    processed: Mutex<Vec<JobId>>,
    abandoned: Mutex<Vec<JobId>>,
}

impl RecordingProcessor {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn processed(&self) -> Vec<JobId> {
        self.processed.lock().clone()
    }
}

#[async_trait]
impl JobProcessor for RecordingProcessor {
    async fn process(&self, job_id: JobId) -> Result<(), PipelineError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        if !self.in_flight.lock().insert(job_id) {
            self.double_owned.store(true, Ordering::SeqCst);
        }
        if self.panic_on == Some(job_id) {
            panic!("processor blew up");
        }

        tokio::time::sleep(self.delay).await;

        self.in_flight.lock().remove(&job_id);
        self.processed.lock().push(job_id);
        Ok(())
    }

    async fn abandon(&self, job_id: JobId, _reason: &str) {
        self.in_flight.lock().remove(&job_id);
        self.abandoned.lock().push(job_id);
    }
}

fn config(worker_count: usize, capacity: usize, enqueue_timeout: Duration) -> QueueConfig {
    QueueConfig {
        worker_count,
        capacity,
        enqueue_timeout,
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within 5s");
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let processor = Arc::new(RecordingProcessor::default());
    let result = JobQueue::new(config(0, 1, Duration::from_millis(10)), processor.clone());
    assert!(matches!(result, Err(QueueError::InvalidConfig { .. })));

    let result = JobQueue::new(config(1, 0, Duration::from_millis(10)), processor);
    assert!(matches!(result, Err(QueueError::InvalidConfig { .. })));
}

#[tokio::test]
async fn test_jobs_enqueued_before_start_are_processed() {
    let processor = Arc::new(RecordingProcessor::default());
    let queue = JobQueue::new(config(2, 10, Duration::from_secs(1)), processor.clone()).unwrap();

    let ids: Vec<JobId> = (0..5).map(|_| JobId::new()).collect();
    for id in &ids {
        queue.enqueue(*id).await.unwrap();
    }
    assert_eq!(queue.len(), 5);

    queue.start().await.unwrap();
    assert!(queue.is_running());
    wait_until(|| processor.processed().len() == 5).await;
    queue.stop().await;

    let processed: HashSet<JobId> = processor.processed().into_iter().collect();
    assert_eq!(processed, ids.into_iter().collect());
    assert!(!queue.is_running());
}

#[tokio::test]
async fn test_full_buffer_times_out_with_queue_full() {
    let processor = Arc::new(RecordingProcessor::default());
    let queue = JobQueue::new(config(1, 1, Duration::from_millis(50)), processor).unwrap();

    queue.enqueue(JobId::new()).await.unwrap();
    assert_eq!(queue.len(), 1);

    let rejected = JobId::new();
    let err = queue.enqueue(rejected).await.unwrap_err();

    assert_eq!(
        err,
        QueueError::QueueFull {
            job_id: rejected,
            timeout: Duration::from_millis(50)
        }
    );
    assert_eq!(queue.len(), 1);
}

#[tokio::test]
async fn test_start_twice_and_start_after_stop() {
    let processor = Arc::new(RecordingProcessor::default());
    let queue = JobQueue::new(config(1, 1, Duration::from_millis(10)), processor).unwrap();

    queue.start().await.unwrap();
    assert_eq!(queue.start().await, Err(QueueError::AlreadyStarted));

    queue.stop().await;
    assert_eq!(queue.start().await, Err(QueueError::Stopped));
}

#[tokio::test]
async fn test_enqueue_after_stop_is_closed() {
    let processor = Arc::new(RecordingProcessor::default());
    let queue = JobQueue::new(config(1, 4, Duration::from_millis(10)), processor).unwrap();
    queue.start().await.unwrap();
    queue.stop().await;

    let id = JobId::new();
    assert_eq!(
        queue.enqueue(id).await,
        Err(QueueError::Closed { job_id: id })
    );
}

#[tokio::test]
async fn test_stop_waits_for_in_flight_jobs_and_dequeues_nothing_more() {
    let processor = Arc::new(RecordingProcessor::with_delay(Duration::from_millis(200)));
    let queue = JobQueue::new(config(2, 10, Duration::from_secs(1)), processor.clone()).unwrap();

    for _ in 0..4 {
        queue.enqueue(JobId::new()).await.unwrap();
    }
    queue.start().await.unwrap();
    wait_until(|| processor.started.load(Ordering::SeqCst) == 2).await;

    queue.stop().await;

    assert_eq!(processor.processed().len(), 2);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(processor.started.load(Ordering::SeqCst), 2);
    assert_eq!(processor.processed().len(), 2);
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let processor = Arc::new(RecordingProcessor::with_delay(Duration::from_millis(50)));
    let queue = JobQueue::new(config(2, 4, Duration::from_secs(1)), processor.clone()).unwrap();
    queue.enqueue(JobId::new()).await.unwrap();
    queue.start().await.unwrap();
    wait_until(|| processor.started.load(Ordering::SeqCst) == 1).await;

    tokio::join!(queue.stop(), queue.stop());
    queue.stop().await;

    assert_eq!(processor.processed().len(), 1);
}

#[tokio::test]
async fn test_stop_before_start() {
    let processor = Arc::new(RecordingProcessor::default());
    let queue = JobQueue::new(config(1, 1, Duration::from_millis(10)), processor).unwrap();
    queue.stop().await;
    assert!(!queue.is_running());
}

#[tokio::test]
async fn test_every_job_dequeued_exactly_once() {
    let processor = Arc::new(RecordingProcessor::with_delay(Duration::from_millis(1)));
    let queue = JobQueue::new(config(4, 64, Duration::from_secs(1)), processor.clone()).unwrap();
    queue.start().await.unwrap();

    for _ in 0..50 {
        queue.enqueue(JobId::new()).await.unwrap();
    }
    wait_until(|| processor.processed().len() == 50).await;
    queue.stop().await;

    let processed = processor.processed();
    let unique: HashSet<JobId> = processed.iter().copied().collect();
    assert_eq!(processed.len(), 50);
    assert_eq!(unique.len(), 50);
    assert!(!processor.double_owned.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_panicking_job_is_abandoned_and_worker_continues() {
    let bad = JobId::new();
    let good = JobId::new();
    let processor = Arc::new(RecordingProcessor {
        panic_on: Some(bad),
        ..RecordingProcessor::default()
    });
    let queue = JobQueue::new(config(1, 4, Duration::from_secs(1)), processor.clone()).unwrap();

    queue.enqueue(bad).await.unwrap();
    queue.enqueue(good).await.unwrap();
    queue.start().await.unwrap();

    wait_until(|| processor.processed().contains(&good)).await;
    queue.stop().await;

    assert_eq!(*processor.abandoned.lock(), vec![bad]);
    assert_eq!(processor.processed(), vec![good]);
}

#[tokio::test]
async fn test_single_slot_queue_with_slow_job_never_drops_silently() {
    let processor = Arc::new(RecordingProcessor::with_delay(Duration::from_millis(300)));
    let queue = JobQueue::new(config(1, 1, Duration::from_millis(50)), processor.clone()).unwrap();
    queue.start().await.unwrap();

    let first = JobId::new();
    queue.enqueue(first).await.unwrap();
    wait_until(|| processor.started.load(Ordering::SeqCst) == 1).await;

    let second = JobId::new();
    queue.enqueue(second).await.unwrap();

    let third = JobId::new();
    let err = queue.enqueue(third).await.unwrap_err();
    assert!(matches!(err, QueueError::QueueFull { job_id, .. } if job_id == third));

    wait_until(|| processor.processed().len() == 2).await;
    queue.stop().await;

    assert_eq!(processor.processed(), vec![first, second]);
}
