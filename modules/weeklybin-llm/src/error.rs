use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("failed to build http client: {0}")]
    Misconfiguration(String),

    #[error("request to {provider} timed out after {elapsed_secs}s")]
    Timeout { provider: String, elapsed_secs: u64 },

    #[error("{provider} returned an error response: {message}")]
    ProviderError { provider: String, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode response body: {0}")]
    Decode(String),
}
