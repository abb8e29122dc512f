use thiserror::Error;

pub type Result<T> = std::result::Result<T, EnrichError>;

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("metadata fetch failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Queue(#[from] weeklybin_queue::QueueError),
}
