//! Bounded ingest queue: a small worker pool drains uploads so a burst of
//! concurrent ingests can't pile up unbounded `spawn_blocking` DSP work.
//! Grounded on the teacher's batching constants and this crate's concurrency
//! section (`SPEC_FULL.md` §5): a fixed channel capacity with `try_send`,
//! 429 on saturation rather than unbounded queuing.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::engine::{Engine, IngestRequest};
use crate::error::EngineError;

/// Channel capacity before `enqueue` starts rejecting with `QueueFull`.
pub const QUEUE_CAPACITY: usize = 64;
/// Number of concurrent workers draining the queue.
pub const WORKER_COUNT: usize = 4;

pub struct IngestQueue {
    sender: mpsc::Sender<IngestRequest>,
}

impl IngestQueue {
    /// Spawns `WORKER_COUNT` workers pulling from a bounded channel, each
    /// running `engine.ingest` for the jobs it receives.
    pub fn spawn(engine: Arc<Engine>) -> Self {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        for worker_id in 0..WORKER_COUNT {
            let engine = engine.clone();
            let receiver = receiver.clone();
            tokio::spawn(async move {
                loop {
                    let job = {
                        let mut receiver = receiver.lock().await;
                        receiver.recv().await
                    };
                    let Some(job) = job else {
                        break;
                    };

                    tracing::debug!(worker_id, title = %job.title, "ingest job starting");
                    if let Err(e) = engine.ingest_now(job).await {
                        tracing::error!(worker_id, error = %e, "ingest job failed");
                    }
                }
            });
        }

        Self { sender }
    }

    /// Enqueues `job` without blocking; returns `QueueFull` if the channel
    /// is at capacity rather than waiting for room.
    pub fn enqueue(&self, job: IngestRequest) -> Result<(), EngineError> {
        self.sender
            .try_send(job)
            .map_err(|_| EngineError::QueueFull)
    }
}
