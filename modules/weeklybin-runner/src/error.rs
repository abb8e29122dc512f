//! Typed errors surfaced at the API boundary (spec.md §6, §7).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{url} is a video-only host, not accepted for conversion")]
    VideoOnlyUrl { url: String },

    #[error("job {0} not found")]
    JobNotFound(String),

    #[error("rejected: path resolves outside the data directory")]
    PathTraversal,

    #[error("cookie upload rejected: {0}")]
    InvalidCookies(String),

    #[error(transparent)]
    Queue(#[from] weeklybin_queue::QueueError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
