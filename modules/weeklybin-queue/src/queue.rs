//! Named durable queue atop `weeklybin-kv`'s Redis primitives (spec.md §4.2).
//!
//! Key layout per queue `q`:
//! - `queue:{q}:jobs` — hash, jobId -> JSON(JobRecord)
//! - `queue:{q}:waiting` — zset, jobId -> ready-at unix timestamp
//! - `queue:{q}:completed` / `queue:{q}:failed` — zset, jobId -> finished-at unix timestamp
//! - `queue:{q}:schedulers` — hash, schedulerId -> JSON(SchedulerDef)

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;
use weeklybin_kv::KvStore;
use weeklybin_model::JobState;

use crate::error::Result;
use crate::types::{JobOptions, JobRecord, RetentionPolicy, SchedulerDef};

/// Seam over the operations worker logic needs from a queue (spec.md §4.2),
/// so C8/C9/C10 worker handlers can be unit-tested against an in-memory
/// double instead of live Redis.
#[async_trait]
pub trait QueueHandle: Send + Sync {
    async fn add_json(&self, job_id: Option<String>, data: serde_json::Value, options: JobOptions) -> Result<String>;
    async fn get_job(&self, id: &str) -> Result<Option<JobRecord>>;
    async fn get_state(&self, id: &str) -> Result<Option<JobState>>;
    async fn remove(&self, id: &str) -> Result<()>;
}

#[async_trait]
impl QueueHandle for Queue {
    async fn add_json(&self, job_id: Option<String>, data: serde_json::Value, options: JobOptions) -> Result<String> {
        self.add(job_id, &data, options).await
    }

    async fn get_job(&self, id: &str) -> Result<Option<JobRecord>> {
        Queue::get_job(self, id).await
    }

    async fn get_state(&self, id: &str) -> Result<Option<JobState>> {
        Queue::get_state(self, id).await
    }

    async fn remove(&self, id: &str) -> Result<()> {
        Queue::remove(self, id).await
    }
}

#[derive(Clone)]
pub struct Queue {
    kv: KvStore,
    name: String,
}

impl Queue {
    #[must_use]
    pub fn new(kv: KvStore, name: impl Into<String>) -> Self {
        Self {
            kv,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn jobs_key(&self) -> String {
        format!("queue:{}:jobs", self.name)
    }

    fn waiting_key(&self) -> String {
        format!("queue:{}:waiting", self.name)
    }

    fn completed_key(&self) -> String {
        format!("queue:{}:completed", self.name)
    }

    fn failed_key(&self) -> String {
        format!("queue:{}:failed", self.name)
    }

    fn schedulers_key(&self) -> String {
        format!("queue:{}:schedulers", self.name)
    }

    /// Add a job. If `job_id` is `Some` and a non-terminal job with that id
    /// already exists, this is a no-op and the existing id is returned.
    pub async fn add<T: Serialize>(
        &self,
        job_id: Option<String>,
        data: &T,
        options: JobOptions,
    ) -> Result<String> {
        if let Some(ref id) = job_id {
            if let Some(existing) = self.get_job(id).await? {
                if !matches!(existing.state, JobState::Complete | JobState::Failed) {
                    return Ok(existing.id);
                }
            }
        }

        let id = job_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let now = Utc::now();
        let record = JobRecord {
            id: id.clone(),
            queue: self.name.clone(),
            data: serde_json::to_value(data)?,
            options: options.clone(),
            state: JobState::Queued,
            attempts_made: 0,
            progress: 0,
            failed_reason: None,
            created_at: now,
            processed_at: None,
            finished_at: None,
        };
        self.kv.hset_json(&self.jobs_key(), &id, &record).await?;
        let ready_at = (now.timestamp() + options.delay_secs as i64) as f64;
        self.kv.zadd(&self.waiting_key(), &id, ready_at).await?;
        Ok(id)
    }

    pub async fn get_job(&self, id: &str) -> Result<Option<JobRecord>> {
        Ok(self.kv.hget_json(&self.jobs_key(), id).await?)
    }

    pub async fn get_job_data<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        match self.get_job(id).await? {
            Some(record) => Ok(Some(serde_json::from_value(record.data)?)),
            None => Ok(None),
        }
    }

    pub async fn get_state(&self, id: &str) -> Result<Option<JobState>> {
        Ok(self.get_job(id).await?.map(|r| r.state))
    }

    pub async fn get_completed(&self) -> Result<Vec<JobRecord>> {
        self.fetch_all(&self.completed_key()).await
    }

    pub async fn get_failed(&self) -> Result<Vec<JobRecord>> {
        self.fetch_all(&self.failed_key()).await
    }

    async fn fetch_all(&self, set_key: &str) -> Result<Vec<JobRecord>> {
        let ids = self.kv.zrange(set_key, 0, -1).await?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.get_job(&id).await? {
                out.push(record);
            }
        }
        Ok(out)
    }

    pub async fn remove(&self, id: &str) -> Result<()> {
        self.kv.hdel(&self.jobs_key(), id).await?;
        self.kv.zrem(&self.waiting_key(), id).await?;
        self.kv.zrem(&self.completed_key(), id).await?;
        self.kv.zrem(&self.failed_key(), id).await?;
        Ok(())
    }

    pub async fn upsert_scheduler(
        &self,
        id: &str,
        every_secs: u64,
        start_date: Option<chrono::DateTime<Utc>>,
        job_template: serde_json::Value,
        job_options: JobOptions,
    ) -> Result<()> {
        let def = SchedulerDef {
            id: id.to_string(),
            every_secs,
            start_date,
            job_template,
            job_options,
            last_tick_at: None,
        };
        self.kv.hset_json(&self.schedulers_key(), id, &def).await?;
        Ok(())
    }

    pub async fn schedulers(&self) -> Result<Vec<SchedulerDef>> {
        Ok(self
            .kv
            .hgetall_json(&self.schedulers_key())
            .await?
            .into_iter()
            .map(|(_, def)| def)
            .collect())
    }

    pub async fn record_scheduler_tick(&self, def: &SchedulerDef) -> Result<()> {
        let mut updated = def.clone();
        updated.last_tick_at = Some(Utc::now());
        self.kv
            .hset_json(&self.schedulers_key(), &updated.id, &updated)
            .await?;
        Ok(())
    }

    /// Proactively prunes completed/failed records past `policy`, rather
    /// than waiting for the next same-state job to trigger
    /// [`Queue::apply_retention`] reactively. `max_age_secs` retention in
    /// particular can otherwise sit unenforced indefinitely on a queue that
    /// stops producing jobs of that terminal state.
    pub async fn sweep_retention(&self, completed_policy: RetentionPolicy, failed_policy: RetentionPolicy) -> Result<()> {
        self.apply_retention(&self.completed_key(), completed_policy).await?;
        self.apply_retention(&self.failed_key(), failed_policy).await?;
        Ok(())
    }

    // --- internals used by the worker harness --------------------------

    /// Among jobs past their `ready_at`, picks the one with the highest
    /// `priority`, breaking ties by earliest `ready_at` (spec.md §5: "within
    /// a single queue, enqueue order is the default processing order,
    /// modified by priority and delayed scheduling").
    pub(crate) async fn claim_ready(&self) -> Result<Option<JobRecord>> {
        let now = Utc::now().timestamp() as f64;
        let ready = self
            .kv
            .zrangebyscore(&self.waiting_key(), f64::NEG_INFINITY, now)
            .await?;
        if ready.is_empty() {
            return Ok(None);
        }

        let mut candidates = Vec::with_capacity(ready.len());
        for (id, ready_at) in ready {
            if let Some(record) = self.get_job(&id).await? {
                candidates.push((ready_at, record));
            }
        }

        let Some(best) = candidates.iter().enumerate().max_by(|(_, a), (_, b)| {
            a.1.options
                .priority
                .cmp(&b.1.options.priority)
                .then_with(|| b.0.partial_cmp(&a.0).unwrap())
        }) else {
            return Ok(None);
        };
        let (_, mut record) = candidates.swap_remove(best.0);

        self.kv.zrem(&self.waiting_key(), &record.id).await?;
        record.state = JobState::Processing;
        record.processed_at = Some(Utc::now());
        self.kv.hset_json(&self.jobs_key(), &record.id, &record).await?;
        Ok(Some(record))
    }

    pub(crate) async fn mark_complete(&self, mut record: JobRecord) -> Result<()> {
        let now = Utc::now();
        record.state = JobState::Complete;
        record.finished_at = Some(now);
        self.kv
            .hset_json(&self.jobs_key(), &record.id, &record)
            .await?;
        self.kv
            .zadd(&self.completed_key(), &record.id, now.timestamp() as f64)
            .await?;
        self.apply_retention(&self.completed_key(), record.options.remove_on_complete)
            .await?;
        Ok(())
    }

    /// Requeue with backoff (non-terminal failure) or mark terminal failure.
    pub(crate) async fn mark_failed(
        &self,
        mut record: JobRecord,
        reason: String,
    ) -> Result<bool> {
        record.attempts_made += 1;
        record.failed_reason = Some(reason);
        let terminal = record.attempts_made >= record.options.attempts;

        if terminal {
            let now = Utc::now();
            record.state = JobState::Failed;
            record.finished_at = Some(now);
            self.kv
                .hset_json(&self.jobs_key(), &record.id, &record)
                .await?;
            self.kv
                .zadd(&self.failed_key(), &record.id, now.timestamp() as f64)
                .await?;
            self.apply_retention(&self.failed_key(), record.options.remove_on_fail)
                .await?;
        } else {
            record.state = JobState::Queued;
            let delay = record.options.backoff.delay_secs(record.attempts_made);
            let ready_at = (Utc::now().timestamp() + delay as i64) as f64;
            self.kv
                .hset_json(&self.jobs_key(), &record.id, &record)
                .await?;
            self.kv
                .zadd(&self.waiting_key(), &record.id, ready_at)
                .await?;
        }
        Ok(terminal)
    }

    pub async fn set_progress(&self, id: &str, progress: u8) -> Result<()> {
        if let Some(mut record) = self.get_job(id).await? {
            record.progress = progress.min(100);
            self.kv.hset_json(&self.jobs_key(), id, &record).await?;
        }
        Ok(())
    }

    async fn apply_retention(&self, set_key: &str, policy: RetentionPolicy) -> Result<()> {
        if let Some(max_age) = policy.max_age_secs {
            let cutoff = (Utc::now().timestamp() - max_age) as f64;
            let doomed = self
                .kv
                .zrangebyscore(set_key, f64::NEG_INFINITY, cutoff)
                .await?;
            for (id, _) in doomed {
                self.kv.zrem(set_key, &id).await?;
                self.kv.hdel(&self.jobs_key(), &id).await?;
            }
        }
        if let Some(max_count) = policy.max_count {
            let all = self
                .kv
                .zrangebyscore(set_key, f64::NEG_INFINITY, f64::INFINITY)
                .await?;
            if all.len() > max_count {
                let mut sorted = all;
                sorted.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
                let excess = sorted.len() - max_count;
                for (id, _) in sorted.into_iter().take(excess) {
                    self.kv.zrem(set_key, &id).await?;
                    self.kv.hdel(&self.jobs_key(), &id).await?;
                }
            }
        }
        Ok(())
    }
}
