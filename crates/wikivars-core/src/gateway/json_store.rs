//! File-backed gateway: one JSON record per page
//!
//! Layout under the store directory:
//!
//! ```text
//! <store>/store.lock        advisory lock shared by every process
//! <store>/pages/<id>.json   serialized PageRecord
//! ```
//!
//! Writers hold the exclusive lock for the whole read-apply-write cycle, so
//! two renders flushing the same page serialize. Records are replaced
//! through a temp file in the same directory and never observed half written.

use super::PersistenceGateway;
use crate::config::consts::store::{LOCK_FILE, PAGES_DIR, RECORD_EXT};
use crate::config::StoreConfig;
use crate::error::{Result, VarsError};
use crate::lock::{self, StoreLock};
use crate::set::{PageId, SetCollection};
use crate::upsert::{apply_plan, ApplyReport, PageRecord, UpsertPlan};
use crate::variable::Variable;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
    lock_timeout: Duration,
    read_lock_timeout: Duration,
}

impl JsonStore {
    /// Store rooted at `root` with the default lock timeouts
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let defaults = StoreConfig::default();
        Self {
            root: root.into(),
            lock_timeout: defaults.lock_timeout(),
            read_lock_timeout: defaults.read_lock_timeout(),
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            root: config.path.clone(),
            lock_timeout: config.lock_timeout(),
            read_lock_timeout: config.read_lock_timeout(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn page_path(&self, page_id: PageId) -> PathBuf {
        self.pages_dir()
            .join(format!("{}.{}", page_id, RECORD_EXT))
    }

    /// Stored record of a page, read under the shared lock
    pub fn load_record(&self, page_id: PageId) -> Result<Option<PageRecord>> {
        if !self.root.exists() {
            return Ok(None);
        }
        let _guard = self.lock_shared("page read")?;
        self.read_record(page_id)
    }

    /// Ids of every stored page, ascending
    pub fn pages(&self) -> Result<Vec<PageId>> {
        let dir = self.pages_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let _guard = self.lock_shared("page listing")?;

        let mut ids = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| VarsError::StoreReadError {
                page_id: 0,
                reason: format!("Failed to list {}: {}", dir.display(), e),
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            match path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse::<PageId>().ok())
            {
                Some(id) => ids.push(id),
                None => tracing::debug!(path = %path.display(), "skipping stray file in store"),
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    fn pages_dir(&self) -> PathBuf {
        self.root.join(PAGES_DIR)
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    fn lock_shared(&self, purpose: &str) -> Result<StoreLock> {
        Ok(lock::acquire_shared(
            &self.lock_path(),
            self.read_lock_timeout,
            purpose,
        )?)
    }

    fn lock_exclusive(&self, purpose: &str) -> Result<StoreLock> {
        Ok(lock::acquire_exclusive(
            &self.lock_path(),
            self.lock_timeout,
            purpose,
        )?)
    }

    /// Caller holds a lock
    fn read_record(&self, page_id: PageId) -> Result<Option<PageRecord>> {
        let path = self.page_path(page_id);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(VarsError::StoreReadError {
                    page_id,
                    reason: format!("Failed to read {}: {}", path.display(), e),
                })
            }
        };

        let record: PageRecord =
            serde_json::from_str(&content).map_err(|e| VarsError::StoreCorrupt {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        if record.page_id != page_id {
            return Err(VarsError::StoreCorrupt {
                path,
                reason: format!("record belongs to page {}", record.page_id),
            });
        }
        Ok(Some(record))
    }

    /// Caller holds the exclusive lock
    fn write_record(&self, record: &PageRecord) -> Result<()> {
        let page_id = record.page_id;
        let dir = self.pages_dir();
        std::fs::create_dir_all(&dir).map_err(|e| VarsError::StoreWriteError {
            page_id,
            reason: format!("Failed to create {}: {}", dir.display(), e),
        })?;
        let content =
            serde_json::to_string_pretty(record).map_err(|e| VarsError::StoreWriteError {
                page_id,
                reason: format!("Failed to serialize: {}", e),
            })?;
        atomic_write(&content, &self.page_path(page_id), &dir).map_err(|reason| {
            VarsError::StoreWriteError { page_id, reason }
        })
    }

    /// Caller holds the exclusive lock
    fn remove_record(&self, page_id: PageId) -> Result<bool> {
        let path = self.page_path(page_id);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(VarsError::StoreWriteError {
                page_id,
                reason: format!("Failed to remove {}: {}", path.display(), e),
            }),
        }
    }
}

impl PersistenceGateway for JsonStore {
    fn load_sets(&self, page_id: PageId) -> Result<Option<SetCollection>> {
        Ok(self
            .load_record(page_id)?
            .map(|record| record.to_collection()))
    }

    fn load_filtered(
        &self,
        page_id: PageId,
        set_name: &str,
        names: &[String],
    ) -> Result<Option<BTreeMap<String, Variable>>> {
        Ok(self
            .load_record(page_id)?
            .and_then(|record| record.filtered(set_name, names)))
    }

    fn save_plan(&self, plan: &UpsertPlan) -> Result<ApplyReport> {
        if plan.is_empty() {
            return Ok(ApplyReport::default());
        }
        let _guard = self.lock_exclusive("apply plan")?;

        let mut record = self
            .read_record(plan.page_id)?
            .unwrap_or_else(|| PageRecord::new(plan.page_id));
        let report = apply_plan(&mut record, plan);

        if record.sets.is_empty() {
            self.remove_record(plan.page_id)?;
        } else {
            self.write_record(&record)?;
        }
        tracing::debug!(
            page_id = plan.page_id,
            sets = record.sets.len(),
            "page record written"
        );
        Ok(report)
    }

    fn delete_all(&self, page_id: PageId) -> Result<bool> {
        if !self.root.exists() {
            return Ok(false);
        }
        let _guard = self.lock_exclusive("delete page")?;
        self.remove_record(page_id)
    }
}

/// Replace `path` with `content` through a synced temp file in `parent`
fn atomic_write(content: &str, path: &Path, parent: &Path) -> std::result::Result<(), String> {
    let mut temp_file = NamedTempFile::new_in(parent)
        .map_err(|e| format!("Failed to create temp file: {}", e))?;
    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| format!("Failed to write temp file: {}", e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| format!("Failed to sync temp file: {}", e))?;
    temp_file
        .persist(path)
        .map_err(|e| format!("Failed to persist temp file: {}", e))?;

    #[cfg(unix)]
    {
        std::fs::File::open(parent)
            .and_then(|dir| dir.sync_all())
            .map_err(|e| format!("Failed to sync {}: {}", parent.display(), e))?;
    }

    Ok(())
}
