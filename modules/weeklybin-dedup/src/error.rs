use thiserror::Error;

pub type Result<T> = std::result::Result<T, DedupError>;

#[derive(Debug, Error)]
pub enum DedupError {
    #[error(transparent)]
    Kv(#[from] weeklybin_kv::KvError),
}
