//! Advisory file locks around the store directory
//!
//! Writers of page records take an exclusive lock, readers a shared one, so a
//! reader never observes a record while a plan is half applied. Locks are
//! `fs2` advisory locks and are released when the [`StoreLock`] guard drops.

use std::path::Path;
use std::time::Duration;

mod acquire;
mod error;
mod guard;

pub use error::LockError;
pub use guard::{LockMode, StoreLock};

#[cfg(test)]
mod tests;

/// Acquire an exclusive (write) lock on `lock_path`, retrying with backoff
/// until `timeout` elapses.
///
/// ```no_run
/// use wikivars_core::lock::acquire_exclusive;
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let lock_path = std::env::temp_dir().join("wikivars.lock");
/// let guard = acquire_exclusive(&lock_path, Duration::from_secs(30), "apply plan")?;
/// // write page records here
/// drop(guard);
/// # Ok(())
/// # }
/// ```
pub fn acquire_exclusive(
    lock_path: &Path,
    timeout: Duration,
    purpose: &str,
) -> Result<StoreLock, LockError> {
    acquire::acquire_with_retry(lock_path, LockMode::Exclusive, timeout, purpose)
}

/// Acquire a shared (read) lock on `lock_path`.
///
/// Any number of shared holders may coexist; they conflict with an exclusive
/// holder only.
pub fn acquire_shared(
    lock_path: &Path,
    timeout: Duration,
    purpose: &str,
) -> Result<StoreLock, LockError> {
    acquire::acquire_with_retry(lock_path, LockMode::Shared, timeout, purpose)
}
