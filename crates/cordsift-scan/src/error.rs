//! Error types for the similarity scan.

use cordsift_db::DbError;
use cordsift_embed::EmbedError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

/// Every variant aborts the scan.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    #[error("Embedding error: {0}")]
    Embed(#[from] EmbedError),

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}
