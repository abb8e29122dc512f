//! Constructs every module and wires it to the others. Mirrors the
//! teacher's "connect, then construct, then run" shape (see
//! `rootsignal-scout`'s `main.rs`), scaled up to the handful of queues and
//! one long-running worker per queue this system needs instead of a single
//! batch run.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use weeklybin_browser::{BrowserPool, CookieStore};
use weeklybin_dedup::DedupStore;
use weeklybin_enrich::EnrichHandler;
use weeklybin_events::EventBus;
use weeklybin_feeds::FeedCacheStore;
use weeklybin_kv::KvStore;
use weeklybin_llm::{AsrClient, ChatClient};
use weeklybin_model::Config;
use weeklybin_queue::{Queue, RetentionPolicy, Worker};
use weeklybin_scheduler::{configured_sources, register_startup_schedulers, SchedulerRunner, SweptQueue};
use weeklybin_store::WeeklyBinStore;
use weeklybin_workers::{ConversionHandler, MediaHandler, PodcastHandler};

use crate::api::WeeklyBinApi;

const CONVERSION_CONCURRENCY: usize = 1;
const MEDIA_CONCURRENCY: usize = 2;
const PODCAST_CONCURRENCY: usize = 1;
/// Not specified by spec.md §4.7 (unlike C8/C9/C10, which each name a
/// concurrency). This stage is a plain HTTP fetch + extraction with no
/// shared resource to serialize on, so it is sized generously relative to
/// the browser- and LLM-bound workers.
const ENRICH_CONCURRENCY: usize = 4;

pub struct Runtime {
    pub api: Arc<WeeklyBinApi>,
    pub events: EventBus,
    browser_pool: Arc<BrowserPool>,
    conversion_worker: Worker<ConversionHandler>,
    media_worker: Worker<MediaHandler>,
    podcast_worker: Worker<PodcastHandler>,
    enrich_worker: Worker<EnrichHandler>,
    scheduler: SchedulerRunner,
}

impl Runtime {
    pub async fn build(config: Arc<Config>) -> anyhow::Result<Self> {
        let kv = KvStore::connect(&config.redis_url()).await?;

        let conversion_queue = Queue::new(kv.clone(), "conversion");
        let media_queue = Queue::new(kv.clone(), "media");
        let podcast_queue = Queue::new(kv.clone(), "podcast");
        let metadata_queue = Queue::new(kv.clone(), "metadata-extraction");
        let scheduler_registry = Queue::new(kv.clone(), "scheduler");

        let store = Arc::new(WeeklyBinStore::new(config.data_dir.clone()));
        let events = EventBus::new();

        let browser_pool = Arc::new(BrowserPool::new());
        browser_pool.init().await?;
        let cookie_store = Arc::new(CookieStore::new(config.cookies_file.clone()));

        let vision_client = ChatClient::new(config.vision_model_host.clone(), "vision")?;
        let text_client = ChatClient::new(config.vision_model_host.clone(), "text")?;
        let asr_client = AsrClient::new(config.asr_host.clone())?;

        let conversion_handler = ConversionHandler::new(
            Arc::clone(&browser_pool),
            Arc::clone(&cookie_store),
            vision_client,
            Arc::clone(&store),
            events.clone(),
            Arc::clone(&config),
        )?;
        let media_handler = MediaHandler::new(Arc::clone(&config), events.clone())?;
        let podcast_handler = PodcastHandler::new(asr_client, text_client, Arc::clone(&config), events.clone())?;
        let enrich_handler = EnrichHandler::new(conversion_queue.clone(), media_queue.clone(), podcast_queue.clone());

        let conversion_worker = Worker::new(conversion_queue.clone(), conversion_handler, CONVERSION_CONCURRENCY);
        let media_worker = Worker::new(media_queue.clone(), media_handler, MEDIA_CONCURRENCY);
        let podcast_worker = Worker::new(podcast_queue.clone(), podcast_handler, PODCAST_CONCURRENCY);
        let enrich_worker = Worker::new(metadata_queue.clone(), enrich_handler, ENRICH_CONCURRENCY)
            .with_poll_interval(Duration::from_millis(250));

        register_startup_schedulers(&scheduler_registry, &config).await?;
        let dedup = DedupStore::new(kv.clone());
        let cache_store = FeedCacheStore::new(kv.clone());
        let sources = configured_sources(&config);
        let swept_queues = [conversion_queue.clone(), media_queue.clone(), podcast_queue.clone(), metadata_queue.clone()]
            .into_iter()
            .map(|queue| SweptQueue {
                queue,
                remove_on_complete: RetentionPolicy::default(),
                remove_on_fail: RetentionPolicy::default(),
            })
            .collect();
        let scheduler = SchedulerRunner::new(scheduler_registry, cache_store, dedup, metadata_queue, sources, swept_queues);

        let api = Arc::new(WeeklyBinApi::new(
            conversion_queue,
            media_queue,
            podcast_queue,
            Arc::clone(&store),
            config.cookies_file.clone(),
        ));

        Ok(Self {
            api,
            events,
            browser_pool,
            conversion_worker,
            media_worker,
            podcast_worker,
            enrich_worker,
            scheduler,
        })
    }

    /// Spawns every worker and the scheduler, waits for all of them to
    /// drain after `shutdown` flips, then closes the browser last (spec.md
    /// §5: "close the browser last, so no handler is mid-capture").
    pub async fn run(self, shutdown: Arc<AtomicBool>) {
        let mut tasks = tokio::task::JoinSet::new();
        tasks.spawn(self.conversion_worker.run(Arc::clone(&shutdown)));
        tasks.spawn(self.media_worker.run(Arc::clone(&shutdown)));
        tasks.spawn(self.podcast_worker.run(Arc::clone(&shutdown)));
        tasks.spawn(self.enrich_worker.run(Arc::clone(&shutdown)));
        tasks.spawn(self.scheduler.run(Arc::clone(&shutdown)));

        while tasks.join_next().await.is_some() {}

        self.browser_pool.close().await;
    }
}
