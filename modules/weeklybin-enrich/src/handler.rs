//! Worker-harness adapter for C7, run continuously against the
//! metadata-extraction queue the same way C8/C9/C10 run against theirs
//! (spec.md §5: "parallel workers, one per queue, each with explicit
//! concurrency").

use async_trait::async_trait;
use serde::Deserialize;
use weeklybin_model::BookmarkItem;
use weeklybin_queue::{JobHandler, JobRecord, ProgressReporter, Queue};

use crate::pipeline::process;

#[derive(Deserialize)]
struct MetadataJob {
    item: BookmarkItem,
}

pub struct EnrichHandler {
    client: reqwest::Client,
    conversion_queue: Queue,
    media_queue: Queue,
    podcast_queue: Queue,
}

impl EnrichHandler {
    #[must_use]
    pub fn new(conversion_queue: Queue, media_queue: Queue, podcast_queue: Queue) -> Self {
        Self {
            client: crate::fetch::build_client(),
            conversion_queue,
            media_queue,
            podcast_queue,
        }
    }
}

#[async_trait]
impl JobHandler for EnrichHandler {
    async fn handle(&self, job: &JobRecord, _progress: &ProgressReporter) -> anyhow::Result<()> {
        let wrapped: MetadataJob = serde_json::from_value(job.data.clone())?;
        process(wrapped.item, &self.client, &self.conversion_queue, &self.media_queue, &self.podcast_queue).await?;
        Ok(())
    }
}
