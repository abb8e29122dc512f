use thiserror::Error;

pub type Result<T> = std::result::Result<T, FeedError>;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed fetch failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("feed parse failed: {0}")]
    Parse(String),

    #[error(transparent)]
    Kv(#[from] weeklybin_kv::KvError),

    #[error(transparent)]
    Dedup(#[from] weeklybin_dedup::DedupError),

    #[error(transparent)]
    Queue(#[from] weeklybin_queue::QueueError),
}
