//! Error types for the receipts store.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for store and utility operations.
#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("data not found")]
    DataMissing,

    #[error("path not found: {}", .0.display())]
    PathMissing(PathBuf),

    #[error("conflicting arguments: {0}")]
    ArgumentConflict(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("index error: row {index} out of range (len={len})")]
    IndexOutOfRange { index: isize, len: usize },

    #[error("you did not confirm - `RecordStore::destroy(Some(\"{expected}\"))`")]
    ConfirmationMismatch { expected: String, got: Option<String> },

    #[error("no header set and no pending records to derive one from")]
    HeaderUnresolvable,

    #[error("duplicate field in header: {0}")]
    DuplicateField(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid file format: {0}")]
    InvalidFormat(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),
}

impl From<serde_json::Error> for ReceiptError {
    fn from(e: serde_json::Error) -> Self {
        ReceiptError::Serialization(e.to_string())
    }
}

/// Result type for receipts operations.
pub type Result<T> = std::result::Result<T, ReceiptError>;
