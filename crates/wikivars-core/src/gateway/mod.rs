//! Persistence of variable sets
//!
//! The engine talks to storage only through [`PersistenceGateway`]. Absent
//! data is `Ok(None)`; only genuine storage failures are errors.

mod json_store;
mod memory;

#[cfg(test)]
mod tests;

pub use json_store::JsonStore;
pub use memory::MemoryGateway;

use crate::error::Result;
use crate::set::{PageId, SetCollection};
use crate::upsert::{ApplyReport, UpsertPlan};
use crate::variable::Variable;
use std::collections::BTreeMap;

pub trait PersistenceGateway {
    /// Every stored set of a page, with set ids filled in
    fn load_sets(&self, page_id: PageId) -> Result<Option<SetCollection>>;

    /// Variables of one stored set, restricted to `names` unless it is empty
    fn load_filtered(
        &self,
        page_id: PageId,
        set_name: &str,
        names: &[String],
    ) -> Result<Option<BTreeMap<String, Variable>>>;

    /// Apply a plan atomically with respect to other writers of the page
    fn save_plan(&self, plan: &UpsertPlan) -> Result<ApplyReport>;

    /// Drop everything stored for a page; `false` when nothing was stored
    fn delete_all(&self, page_id: PageId) -> Result<bool>;
}

impl<G: PersistenceGateway + ?Sized> PersistenceGateway for &G {
    fn load_sets(&self, page_id: PageId) -> Result<Option<SetCollection>> {
        (**self).load_sets(page_id)
    }

    fn load_filtered(
        &self,
        page_id: PageId,
        set_name: &str,
        names: &[String],
    ) -> Result<Option<BTreeMap<String, Variable>>> {
        (**self).load_filtered(page_id, set_name, names)
    }

    fn save_plan(&self, plan: &UpsertPlan) -> Result<ApplyReport> {
        (**self).save_plan(plan)
    }

    fn delete_all(&self, page_id: PageId) -> Result<bool> {
        (**self).delete_all(page_id)
    }
}
