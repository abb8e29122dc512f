//! Worker harness: polls a queue with concurrency N, executing a handler
//! per job to completion before that slot picks up the next one
//! (spec.md §4.2, §5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::queue::Queue;
use crate::types::JobRecord;

/// Lets a handler report progress milestones mid-`handle()` without holding
/// its own reference to the queue.
#[derive(Clone)]
pub struct ProgressReporter {
    queue: Queue,
    job_id: String,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(queue: Queue, job_id: String) -> Self {
        Self { queue, job_id }
    }

    pub async fn report(&self, progress: u8) {
        if let Err(err) = self.queue.set_progress(&self.job_id, progress).await {
            warn!(job_id = self.job_id, progress, error = %err, "failed to record job progress");
        }
    }
}

#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    async fn handle(&self, job: &JobRecord, progress: &ProgressReporter) -> anyhow::Result<()>;
}

pub struct Worker<H: JobHandler> {
    queue: Queue,
    handler: Arc<H>,
    concurrency: usize,
    poll_interval: Duration,
}

impl<H: JobHandler> Worker<H> {
    #[must_use]
    pub fn new(queue: Queue, handler: H, concurrency: usize) -> Self {
        Self {
            queue,
            handler: Arc::new(handler),
            concurrency: concurrency.max(1),
            poll_interval: Duration::from_millis(500),
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run until `shutdown` is set. Stops claiming new jobs once the flag
    /// flips, then awaits every in-flight handler before returning.
    pub async fn run(self, shutdown: Arc<AtomicBool>) {
        let mut in_flight: JoinSet<()> = JoinSet::new();

        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            while in_flight.len() >= self.concurrency {
                if in_flight.join_next().await.is_none() {
                    break;
                }
            }

            match self.queue.claim_ready().await {
                Ok(Some(job)) => {
                    let handler = Arc::clone(&self.handler);
                    let queue = self.queue.clone();
                    in_flight.spawn(async move {
                        Self::run_one(queue, handler, job).await;
                    });
                }
                Ok(None) => {
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(err) => {
                    warn!(queue = self.queue.name(), error = %err, "failed to poll queue");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        while in_flight.join_next().await.is_some() {}
    }

    async fn run_one(queue: Queue, handler: Arc<H>, job: JobRecord) {
        let job_id = job.id.clone();
        let progress = ProgressReporter::new(queue.clone(), job_id.clone());
        match handler.handle(&job, &progress).await {
            Ok(()) => {
                if let Err(err) = queue.mark_complete(job).await {
                    warn!(job_id, error = %err, "failed to record job completion");
                }
            }
            Err(err) => {
                let reason = err.to_string();
                match queue.mark_failed(job, reason.clone()).await {
                    Ok(terminal) => {
                        if terminal {
                            info!(job_id, reason, "job failed terminally");
                        } else {
                            info!(job_id, reason, "job failed, will retry with backoff");
                        }
                    }
                    Err(err) => warn!(job_id, error = %err, "failed to record job failure"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobOptions;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl JobHandler for CountingHandler {
        async fn handle(&self, _job: &JobRecord, _progress: &ProgressReporter) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn concurrency_floor_is_one() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler { calls: Arc::clone(&calls) };
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let _ = handler;
    }

    #[test]
    fn job_options_default_is_single_attempt() {
        let opts = JobOptions::default();
        assert_eq!(opts.attempts, 1);
    }
}
