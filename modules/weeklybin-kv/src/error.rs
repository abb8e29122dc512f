use thiserror::Error;

pub type Result<T> = std::result::Result<T, KvError>;

#[derive(Debug, Error)]
pub enum KvError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
