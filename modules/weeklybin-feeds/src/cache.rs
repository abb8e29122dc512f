//! Per-source conditional-fetch cache (spec.md §3 `FeedCache`).

use serde::{Deserialize, Serialize};
use weeklybin_kv::KvStore;

use crate::error::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedCache {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

pub struct FeedCacheStore {
    kv: KvStore,
}

impl FeedCacheStore {
    #[must_use]
    pub fn new(kv: KvStore) -> Self {
        Self { kv }
    }

    fn key(source: &str) -> String {
        format!("feed:cache:{source}")
    }

    pub async fn get(&self, source: &str) -> Result<FeedCache> {
        Ok(self.kv.get_json(&Self::key(source)).await?.unwrap_or_default())
    }

    pub async fn set(&self, source: &str, cache: &FeedCache) -> Result<()> {
        self.kv.set_json(&Self::key(source), cache).await?;
        Ok(())
    }
}
