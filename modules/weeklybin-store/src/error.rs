use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to parse pdf: {0}")]
    Pdf(lopdf::Error),

    #[error("failed to write pdf: {0}")]
    PdfIo(lopdf::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
