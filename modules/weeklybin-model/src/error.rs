use thiserror::Error;

/// Shared error type for crates that don't need their own closed taxonomy.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("invalid media type: {0}")]
    InvalidMediaType(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
