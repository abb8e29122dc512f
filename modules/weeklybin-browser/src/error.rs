use thiserror::Error;
use weeklybin_model::FailureClassification;

pub type Result<T> = std::result::Result<T, BrowserError>;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser pool not initialized")]
    NotInitialized,

    #[error("browser pool already initialized")]
    AlreadyInitialized,

    #[error(transparent)]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("browser config error: {0}")]
    Config(String),

    /// A classified capture failure — timeout, bot detection, navigation
    /// error. Carries the typed kind so callers don't have to re-parse a
    /// string.
    #[error("{0}")]
    Capture(FailureClassification),
}

impl From<FailureClassification> for BrowserError {
    fn from(f: FailureClassification) -> Self {
        Self::Capture(f)
    }
}
