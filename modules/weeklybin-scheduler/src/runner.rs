//! Drives the two schedules registered by [`crate::register`]: the feed
//! poll (direct `weeklybin_feeds::poll()` calls, not itself a queued job —
//! §4.6's fetch/parse/dedup/fan-out all happen in one tick) and the batch
//! tick (a proactive retention sweep across the worker queues, per
//! SPEC_FULL.md §B's "queue retention sweeper" supplement).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};
use weeklybin_dedup::DedupStore;
use weeklybin_feeds::{poll, FeedCacheStore, FeedEndpoint};
use weeklybin_model::FeedSource;
use weeklybin_queue::{Queue, RetentionPolicy};

use crate::register::{BATCH_TICK_SCHEDULER_ID, FEED_POLL_SCHEDULER_ID};
use crate::tick::is_due;

const CHECK_INTERVAL: Duration = Duration::from_secs(15);

/// A queue plus the default retention policy its jobs are enqueued with —
/// the same policy a completed/failed job of that queue would carry, so
/// the periodic sweep prunes by the same rule the reactive one does.
pub struct SweptQueue {
    pub queue: Queue,
    pub remove_on_complete: RetentionPolicy,
    pub remove_on_fail: RetentionPolicy,
}

pub struct SchedulerRunner {
    registry: Queue,
    fetch_client: reqwest::Client,
    cache_store: FeedCacheStore,
    dedup: DedupStore,
    metadata_queue: Queue,
    sources: Vec<(FeedSource, FeedEndpoint)>,
    swept_queues: Vec<SweptQueue>,
}

impl SchedulerRunner {
    #[must_use]
    pub fn new(
        registry: Queue,
        cache_store: FeedCacheStore,
        dedup: DedupStore,
        metadata_queue: Queue,
        sources: Vec<(FeedSource, FeedEndpoint)>,
        swept_queues: Vec<SweptQueue>,
    ) -> Self {
        Self {
            registry,
            fetch_client: reqwest::Client::new(),
            cache_store,
            dedup,
            metadata_queue,
            sources,
            swept_queues,
        }
    }

    pub async fn run(self, shutdown: Arc<AtomicBool>) {
        loop {
            if shutdown.load(Ordering::Relaxed) {
                return;
            }

            match self.registry.schedulers().await {
                Ok(defs) => {
                    let now = Utc::now();
                    for def in defs {
                        if !is_due(&def, now) {
                            continue;
                        }
                        self.dispatch(&def.id).await;
                        if let Err(err) = self.registry.record_scheduler_tick(&def).await {
                            warn!(scheduler = def.id, error = %err, "failed to record scheduler tick");
                        }
                    }
                }
                Err(err) => warn!(error = %err, "failed to read scheduler registry"),
            }

            tokio::time::sleep(CHECK_INTERVAL).await;
        }
    }

    async fn dispatch(&self, scheduler_id: &str) {
        match scheduler_id {
            FEED_POLL_SCHEDULER_ID => self.run_feed_poll().await,
            BATCH_TICK_SCHEDULER_ID => self.run_batch_tick().await,
            other => warn!(scheduler = other, "unknown scheduler id, skipping"),
        }
    }

    async fn run_feed_poll(&self) {
        for (source, endpoint) in &self.sources {
            let result = poll(
                &self.fetch_client,
                &self.cache_store,
                &self.dedup,
                &self.metadata_queue,
                *source,
                endpoint,
            )
            .await;
            match result {
                Ok(outcome) if !outcome.not_modified => {
                    info!(source = source.as_str(), new_items = outcome.new_items, "feed poll tick");
                }
                Ok(_) => {}
                Err(err) => warn!(source = source.as_str(), error = %err, "feed poll tick failed"),
            }
        }
    }

    async fn run_batch_tick(&self) {
        for swept in &self.swept_queues {
            if let Err(err) = swept
                .queue
                .sweep_retention(swept.remove_on_complete, swept.remove_on_fail)
                .await
            {
                warn!(queue = swept.queue.name(), error = %err, "batch tick retention sweep failed");
            }
        }
        info!(queues = self.swept_queues.len(), "batch tick retention sweep complete");
    }
}
