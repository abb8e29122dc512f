//! Startup registration of the scheduler's two recurring jobs (spec.md
//! §4.11). Both live as `SchedulerDef`s on a dedicated registry queue;
//! [`crate::runner::SchedulerRunner`] is the thing that actually ticks them.

use weeklybin_model::Config;
use weeklybin_queue::{JobOptions, Queue};

pub const FEED_POLL_SCHEDULER_ID: &str = "feed-poll";
pub const BATCH_TICK_SCHEDULER_ID: &str = "batch-tick";

const BATCH_TICK_EVERY_SECS: u64 = 5 * 60;
const BATCH_TICK_OFFSET_SECS: i64 = 150; // 2.5 minutes, to avoid overlapping the feed poll

/// Registers the feed-poll and batch-tick schedules if at least one feed
/// source is configured; a deployment with no feed sources has nothing for
/// the scheduler to do.
pub async fn register_startup_schedulers(registry: &Queue, config: &Config) -> anyhow::Result<()> {
    if config.feed_url_rss.is_none() && config.feed_url_api.is_none() {
        return Ok(());
    }

    registry
        .upsert_scheduler(
            FEED_POLL_SCHEDULER_ID,
            config.feed_poll_interval_minutes * 60,
            None,
            serde_json::json!({}),
            JobOptions::retryable(),
        )
        .await?;

    let batch_start = chrono::DateTime::from_timestamp(BATCH_TICK_OFFSET_SECS, 0);
    registry
        .upsert_scheduler(
            BATCH_TICK_SCHEDULER_ID,
            BATCH_TICK_EVERY_SECS,
            batch_start,
            serde_json::json!({}),
            JobOptions::retryable(),
        )
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_tick_offset_is_two_and_a_half_minutes() {
        assert_eq!(BATCH_TICK_OFFSET_SECS, 150);
    }
}
