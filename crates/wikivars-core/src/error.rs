use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VarsError {
    // Frame errors
    #[error("FRAME_NOT_FOUND: frame #{0} does not exist in this render tree")]
    FrameNotFound(usize),

    // Store errors
    #[error("STORE_READ_ERROR: failed to read stored sets for page {page_id}: {reason}")]
    StoreReadError { page_id: u64, reason: String },

    #[error("STORE_WRITE_ERROR: failed to write stored sets for page {page_id}: {reason}")]
    StoreWriteError { page_id: u64, reason: String },

    #[error("STORE_LOCK_ERROR: {0}")]
    StoreLockError(#[from] crate::lock::LockError),

    #[error("STORE_CORRUPT: '{path}' is not a valid page record: {reason}")]
    StoreCorrupt { path: PathBuf, reason: String },

    // Config errors
    #[error("CONFIG_PARSE_ERROR: {0}")]
    ConfigParseError(String),

    #[error("CONFIG_INVALID_VALUE: {field}: {reason}")]
    ConfigInvalidValue { field: String, reason: String },

    // IO errors
    #[error("IO_ERROR: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VarsError>;
