use super::PersistenceGateway;
use crate::error::Result;
use crate::set::{PageId, SetCollection};
use crate::upsert::{apply_plan, ApplyReport, PageRecord, UpsertPlan};
use crate::variable::Variable;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// In-process gateway, mostly for tests and previews
#[derive(Debug, Default)]
pub struct MemoryGateway {
    pages: Mutex<BTreeMap<PageId, PageRecord>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the stored record of a page
    pub fn record(&self, page_id: PageId) -> Option<PageRecord> {
        self.pages().get(&page_id).cloned()
    }

    pub fn page_ids(&self) -> Vec<PageId> {
        self.pages().keys().copied().collect()
    }

    fn pages(&self) -> MutexGuard<'_, BTreeMap<PageId, PageRecord>> {
        // Recover from poisoned mutex
        self.pages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PersistenceGateway for MemoryGateway {
    fn load_sets(&self, page_id: PageId) -> Result<Option<SetCollection>> {
        Ok(self.pages().get(&page_id).map(PageRecord::to_collection))
    }

    fn load_filtered(
        &self,
        page_id: PageId,
        set_name: &str,
        names: &[String],
    ) -> Result<Option<BTreeMap<String, Variable>>> {
        Ok(self
            .pages()
            .get(&page_id)
            .and_then(|r| r.filtered(set_name, names)))
    }

    fn save_plan(&self, plan: &UpsertPlan) -> Result<ApplyReport> {
        if plan.is_empty() {
            return Ok(ApplyReport::default());
        }
        let mut pages = self.pages();
        let record = pages
            .entry(plan.page_id)
            .or_insert_with(|| PageRecord::new(plan.page_id));
        let report = apply_plan(record, plan);
        if record.sets.is_empty() {
            pages.remove(&plan.page_id);
        }
        Ok(report)
    }

    fn delete_all(&self, page_id: PageId) -> Result<bool> {
        Ok(self.pages().remove(&page_id).is_some())
    }
}
