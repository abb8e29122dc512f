//! Two-level dedup: per-source feed GUIDs, and global canonical URLs
//! (spec.md §4.1). Both are just `KvStore` sets plus a provenance hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use weeklybin_kv::KvStore;

use crate::error::Result;

const SEEN_URLS_KEY: &str = "bookmarks:seen-urls";

fn guid_key(source: &str) -> String {
    format!("feed:guids:{source}")
}

fn provenance_key(canonical_url: &str) -> String {
    format!("bookmark:{canonical_url}")
}

/// Recorded the first time a canonical URL is marked seen — who brought it in
/// and when, for later `listFiles`/debugging use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlProvenance {
    pub source: String,
    pub first_seen_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct DedupStore {
    kv: KvStore,
}

impl DedupStore {
    #[must_use]
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    pub async fn is_guid_seen(&self, source: &str, guid: &str) -> Result<bool> {
        Ok(self.kv.sismember(&guid_key(source), guid).await?)
    }

    /// Returns `true` if this call newly marked the guid (i.e. it wasn't
    /// already seen), mirroring the atomic "mark-if-absent" the queue and
    /// enricher rely on to avoid a separate check-then-set race.
    pub async fn mark_guid_seen(&self, source: &str, guid: &str) -> Result<bool> {
        Ok(self.kv.sadd_new(&guid_key(source), guid).await?)
    }

    pub async fn is_url_seen(&self, canonical_url: &str) -> Result<bool> {
        Ok(self.kv.sismember(SEEN_URLS_KEY, canonical_url).await?)
    }

    /// Marks the canonical URL seen and, on first sighting, records its
    /// provenance. Returns `true` if this call newly marked the URL.
    pub async fn mark_url_seen(&self, canonical_url: &str, source: &str) -> Result<bool> {
        let newly_marked = self.kv.sadd_new(SEEN_URLS_KEY, canonical_url).await?;
        if newly_marked {
            let provenance = UrlProvenance {
                source: source.to_string(),
                first_seen_at: Utc::now(),
            };
            self.kv
                .hset_json(&provenance_key(canonical_url), "provenance", &provenance)
                .await?;
        }
        Ok(newly_marked)
    }

    pub async fn provenance(&self, canonical_url: &str) -> Result<Option<UrlProvenance>> {
        Ok(self
            .kv
            .hget_json(&provenance_key(canonical_url), "provenance")
            .await?)
    }
}
