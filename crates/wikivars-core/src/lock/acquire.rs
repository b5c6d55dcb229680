//! Lock acquisition with retry and timeout

use super::{LockError, LockMode, StoreLock};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(10);
const MAX_RETRY_DELAY: Duration = Duration::from_millis(500);
const SLOW_LOCK_THRESHOLD: Duration = Duration::from_secs(2);

pub(crate) fn acquire_with_retry(
    lock_path: &Path,
    mode: LockMode,
    timeout: Duration,
    purpose: &str,
) -> Result<StoreLock, LockError> {
    if let Some(parent) = lock_path.parent() {
        fs::create_dir_all(parent).map_err(|source| LockError::Io {
            source,
            path: lock_path.to_path_buf(),
            operation: "create lock directory",
        })?;
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .map_err(|source| LockError::Io {
            source,
            path: lock_path.to_path_buf(),
            operation: "open lock file",
        })?;

    let start = Instant::now();
    let mut retry_delay = INITIAL_RETRY_DELAY;
    let mut reported_slow = false;

    loop {
        let attempt = match mode {
            LockMode::Exclusive => FileExt::try_lock_exclusive(&file),
            LockMode::Shared => FileExt::try_lock_shared(&file),
        };

        match attempt {
            Ok(()) => {
                return Ok(StoreLock {
                    _file: file,
                    path: lock_path.to_path_buf(),
                    mode,
                });
            }
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                let elapsed = start.elapsed();
                if elapsed >= timeout {
                    return Err(LockError::Timeout {
                        path: lock_path.to_path_buf(),
                        purpose: purpose.to_string(),
                    });
                }

                if !reported_slow && elapsed >= SLOW_LOCK_THRESHOLD {
                    tracing::warn!(
                        path = %lock_path.display(),
                        purpose,
                        "still waiting for store lock"
                    );
                    reported_slow = true;
                }

                thread::sleep(retry_delay.min(timeout - elapsed));
                retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
            }
            Err(source) => {
                return Err(LockError::Io {
                    source,
                    path: lock_path.to_path_buf(),
                    operation: "acquire lock",
                });
            }
        }
    }
}
