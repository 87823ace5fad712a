use serde_json::error::Error as SerdeError;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Blob storage I/O failed")]
    Io(#[from] std::io::Error),

    #[error("Blob metadata could not be read or written")]
    Metadata(#[from] SerdeError),

    #[error("Blob id {0} is already taken")]
    Conflict(String),
}
