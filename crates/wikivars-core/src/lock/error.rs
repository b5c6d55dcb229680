//! Error types for store locking

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LockError {
    /// Another holder kept the lock past the timeout
    #[error("timed out waiting for lock on {} ({purpose})", path.display())]
    Timeout { path: PathBuf, purpose: String },

    /// Opening or locking the lock file failed
    #[error("I/O error during {operation} on {}: {source}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
        operation: &'static str,
    },
}
