//! Tests for store locking

use super::{acquire_exclusive, acquire_shared, LockError, LockMode};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[test]
fn test_exclusive_lock_acquired() {
    let temp_dir = TempDir::new().unwrap();
    let lock_path = temp_dir.path().join("store.lock");

    let guard = acquire_exclusive(&lock_path, Duration::from_secs(5), "test").unwrap();
    assert_eq!(guard.mode(), LockMode::Exclusive);
    assert_eq!(guard.path(), lock_path.as_path());
    assert!(lock_path.exists());
}

#[test]
fn test_exclusive_blocks_second_writer() {
    let temp_dir = TempDir::new().unwrap();
    let lock_path = temp_dir.path().join("store.lock");

    let holder_path = lock_path.clone();
    let barrier = Arc::new(Barrier::new(2));
    let holder_barrier = Arc::clone(&barrier);

    let holder = thread::spawn(move || {
        let _lock = acquire_exclusive(&holder_path, Duration::from_secs(5), "holder").unwrap();
        holder_barrier.wait();
        thread::sleep(Duration::from_millis(300));
    });

    barrier.wait();
    let start = Instant::now();
    let result = acquire_exclusive(&lock_path, Duration::from_millis(200), "apply plan");

    assert!(matches!(result, Err(LockError::Timeout { .. })));
    assert!(start.elapsed() >= Duration::from_millis(200));

    holder.join().unwrap();
}

#[test]
fn test_timeout_error_names_purpose() {
    let temp_dir = TempDir::new().unwrap();
    let lock_path = temp_dir.path().join("store.lock");

    let _held = acquire_exclusive(&lock_path, Duration::from_secs(5), "first").unwrap();
    let err = acquire_exclusive(&lock_path, Duration::from_millis(50), "delete page").unwrap_err();
    assert!(err.to_string().contains("delete page"), "{}", err);
}

#[test]
fn test_shared_locks_coexist() {
    let temp_dir = TempDir::new().unwrap();
    let lock_path = temp_dir.path().join("store.lock");

    let _a = acquire_shared(&lock_path, Duration::from_secs(1), "reader a").unwrap();
    let b = acquire_shared(&lock_path, Duration::from_millis(100), "reader b");
    assert!(b.is_ok(), "second reader should not wait: {:?}", b);
}

#[test]
fn test_shared_blocks_writer() {
    let temp_dir = TempDir::new().unwrap();
    let lock_path = temp_dir.path().join("store.lock");

    let _reader = acquire_shared(&lock_path, Duration::from_secs(1), "reader").unwrap();
    let writer = acquire_exclusive(&lock_path, Duration::from_millis(100), "writer");
    assert!(matches!(writer, Err(LockError::Timeout { .. })));
}

#[test]
fn test_released_on_drop() {
    let temp_dir = TempDir::new().unwrap();
    let lock_path = temp_dir.path().join("store.lock");

    {
        let _lock = acquire_exclusive(&lock_path, Duration::from_secs(5), "first").unwrap();
    }

    let again = acquire_exclusive(&lock_path, Duration::from_millis(50), "second");
    assert!(again.is_ok(), "lock should be free after drop: {:?}", again);
}

#[test]
fn test_waiter_gets_lock_after_release() {
    let temp_dir = TempDir::new().unwrap();
    let lock_path = temp_dir.path().join("store.lock");

    let holder_path = lock_path.clone();
    let barrier = Arc::new(Barrier::new(2));
    let holder_barrier = Arc::clone(&barrier);
    let holder = thread::spawn(move || {
        let _lock = acquire_exclusive(&holder_path, Duration::from_secs(5), "holder").unwrap();
        holder_barrier.wait();
        thread::sleep(Duration::from_millis(150));
    });

    barrier.wait();
    let result = acquire_exclusive(&lock_path, Duration::from_secs(2), "waiter");
    assert!(result.is_ok(), "should acquire once holder releases");

    holder.join().unwrap();
}

#[test]
fn test_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let lock_path = temp_dir.path().join("nested/store/store.lock");

    assert!(acquire_shared(&lock_path, Duration::from_secs(1), "read").is_ok());
    assert!(lock_path.parent().unwrap().exists());
}
