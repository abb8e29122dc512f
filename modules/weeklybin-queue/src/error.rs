use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error(transparent)]
    Kv(#[from] weeklybin_kv::KvError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("job {0} not found")]
    JobNotFound(String),
}
