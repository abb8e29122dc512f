//! Thin wrapper over a Redis connection manager exposing the atomic
//! set/hash/sorted-set primitives the rest of the system is built on.
//!
//! Every operation here maps to a single Redis command (or a MULTI/EXEC
//! pipeline of independent commands), so "atomic" means "no read-modify-write
//! race window", not "transactionally isolated across multiple logical keys".
//! That's the single-writer-or-CAS discipline spec.md §4.1/§5 asks for.

pub mod error;

pub use error::{KvError, Result};

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Clone)]
pub struct KvStore {
    conn: ConnectionManager,
}

impl KvStore {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }

    /// For tests: wrap an already-constructed connection manager.
    #[must_use]
    pub fn from_manager(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    // --- sets (dedup membership) -------------------------------------

    /// Add `member` to the set at `key`. Returns `true` if it was newly
    /// added (i.e. wasn't already a member) — this is the atomic
    /// "mark-if-absent" primitive dedup relies on.
    pub async fn sadd_new(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let added: i64 = conn.sadd(key, member).await?;
        Ok(added == 1)
    }

    pub async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        Ok(conn.sismember(key, member).await?)
    }

    // --- hashes (per-canonical-URL provenance, job records) -----------

    pub async fn hset_json<T: Serialize>(&self, key: &str, field: &str, value: &T) -> Result<()> {
        let mut conn = self.conn.clone();
        let payload = serde_json::to_string(value)?;
        let _: () = conn.hset(key, field, payload).await?;
        Ok(())
    }

    pub async fn hget_json<T: DeserializeOwned>(&self, key: &str, field: &str) -> Result<Option<T>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.hget(key, field).await?;
        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    pub async fn hdel(&self, key: &str, field: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.hdel(key, field).await?;
        Ok(())
    }

    pub async fn hgetall_json<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<(String, T)>> {
        let mut conn = self.conn.clone();
        let raw: Vec<(String, String)> = conn.hgetall(key).await?;
        raw.into_iter()
            .map(|(f, v)| Ok((f, serde_json::from_str(&v)?)))
            .collect()
    }

    // --- plain strings (feed cache etag/lastModified) ------------------

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let mut conn = self.conn.clone();
        let payload = serde_json::to_string(value)?;
        let _: () = conn.set(key, payload).await?;
        Ok(())
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await?;
        match raw {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    // --- sorted sets (queue ordering + retention pruning) --------------

    pub async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.zadd(key, member, score).await?;
        Ok(())
    }

    pub async fn zrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.zrange(key, start, stop).await?)
    }

    pub async fn zrem(&self, key: &str, member: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.zrem(key, member).await?;
        Ok(())
    }

    /// Members with `min <= score <= max`, ascending, paired with their score.
    /// Used by the queue worker to find jobs ready to run (score = ready-at
    /// unix timestamp) without pulling the whole set across the wire.
    pub async fn zrangebyscore(&self, key: &str, min: f64, max: f64) -> Result<Vec<(String, f64)>> {
        let mut conn = self.conn.clone();
        let raw: Vec<(String, f64)> = conn
            .zrangebyscore_withscores(key, min, max)
            .await?;
        Ok(raw)
    }

    pub async fn zcard(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn.clone();
        Ok(conn.zcard(key).await?)
    }

    /// Remove entries with score below `min_score` (used for `removeOnComplete`/
    /// `removeOnFail` max-age retention).
    pub async fn zremrangebyscore(&self, key: &str, min_score: f64) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .zrembyscore(key, f64::NEG_INFINITY, min_score)
            .await?;
        Ok(())
    }

    /// Keep only the highest-scoring `max_count` entries (used for
    /// `removeOnComplete`/`removeOnFail` max-count retention).
    pub async fn ztrim_to(&self, key: &str, max_count: isize) -> Result<()> {
        let mut conn = self.conn.clone();
        let total: isize = conn.zcard(key).await?;
        if total > max_count {
            // Ranks are ascending by score; drop the lowest-scoring excess.
            let _: () = conn.zremrangebyrank(key, 0, total - max_count - 1).await?;
        }
        Ok(())
    }
}
