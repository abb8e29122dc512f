//! Job records and per-queue options (spec.md §4.2).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use weeklybin_model::JobState;

/// Exponential backoff: attempt `n` (1-indexed) waits `base * 2^(n-1)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Backoff {
    pub base_secs: u64,
}

impl Backoff {
    #[must_use]
    pub const fn new(base_secs: u64) -> Self {
        Self { base_secs }
    }

    /// Delay before retrying after the `attempts_made`'th failure.
    #[must_use]
    pub fn delay_secs(&self, attempts_made: u32) -> u64 {
        self.base_secs.saturating_mul(1u64 << attempts_made.saturating_sub(1).min(32))
    }
}

/// `removeOnComplete`/`removeOnFail`: prune terminal jobs by count and/or age.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct RetentionPolicy {
    pub max_count: Option<usize>,
    pub max_age_secs: Option<i64>,
}

impl RetentionPolicy {
    #[must_use]
    pub const fn never() -> Self {
        Self {
            max_count: None,
            max_age_secs: None,
        }
    }

    #[must_use]
    pub const fn keep_last(n: usize) -> Self {
        Self {
            max_count: Some(n),
            max_age_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOptions {
    pub attempts: u32,
    pub backoff: Backoff,
    pub remove_on_complete: RetentionPolicy,
    pub remove_on_fail: RetentionPolicy,
    /// Delay (seconds from enqueue) before the job becomes eligible to run.
    pub delay_secs: u64,
    pub priority: i64,
}

impl Default for JobOptions {
    fn default() -> Self {
        Self {
            attempts: 1,
            backoff: Backoff::new(60),
            remove_on_complete: RetentionPolicy::default(),
            remove_on_fail: RetentionPolicy::default(),
            delay_secs: 0,
            priority: 0,
        }
    }
}

impl JobOptions {
    /// Per-queue default of up to 5 attempts with base-60s exponential
    /// backoff (spec.md §4.2, §4.9: "up to 5 attempts with exponential
    /// backoff base 60s (1m, 2m, 4m, 8m, 16m)"). Every queue in this system
    /// wants retry-with-backoff rather than `JobOptions::default()`'s
    /// single-attempt baseline.
    #[must_use]
    pub fn retryable() -> Self {
        Self {
            attempts: 5,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub queue: String,
    pub data: serde_json::Value,
    pub options: JobOptions,
    pub state: JobState,
    pub attempts_made: u32,
    pub progress: u8,
    pub failed_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerDef {
    pub id: String,
    pub every_secs: u64,
    pub start_date: Option<DateTime<Utc>>,
    pub job_template: serde_json::Value,
    pub job_options: JobOptions,
    pub last_tick_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_each_attempt() {
        let b = Backoff::new(60);
        assert_eq!(b.delay_secs(1), 60);
        assert_eq!(b.delay_secs(2), 120);
        assert_eq!(b.delay_secs(3), 240);
        assert_eq!(b.delay_secs(4), 480);
        assert_eq!(b.delay_secs(5), 960);
    }

    #[test]
    fn retention_never_has_no_limits() {
        let r = RetentionPolicy::never();
        assert!(r.max_count.is_none());
        assert!(r.max_age_secs.is_none());
    }
}
