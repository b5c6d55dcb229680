//! RAII guard for store locks

use std::fs::File;
use std::path::{Path, PathBuf};

/// Kind of lock held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Shared,
    Exclusive,
}

/// Held store lock; released when dropped (fs2 locks die with the descriptor)
#[derive(Debug)]
pub struct StoreLock {
    pub(crate) _file: File,
    pub(crate) path: PathBuf,
    pub(crate) mode: LockMode,
}

impl StoreLock {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> LockMode {
        self.mode
    }
}
