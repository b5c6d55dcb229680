//! Reconciling persisted variable sets with a freshly rendered collection
//!
//! Saving a page runs in three steps:
//!
//! 1. [`plan`] compares the stored [`crate::set::SetCollection`] with the one the render
//!    produced and classifies each set name as delete, insert or update.
//! 2. For every update, [`diff_variables`] works out which variable rows
//!    actually change.
//! 3. [`apply_plan`] writes both levels into a [`PageRecord`], deletes first.
//!
//! The stored revision of a set only moves forward. A plan built from an
//! older revision still writes its variable rows but leaves the revision
//! marker alone (see [`ApplyReport::stale_sets`]).

mod apply;
mod diff;
mod planner;


pub use apply::{apply_plan, ApplyReport, PageRecord, StoredSet};
pub use diff::{diff_variables, VariableDiff};
pub use planner::plan;

use crate::set::{PageId, RevId, SetId, VariableSet};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Storage operations moving a page from its stored sets to new ones
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpsertPlan {
    pub page_id: PageId,
    pub old_rev_id: RevId,
    pub new_rev_id: RevId,
    /// Stored sets whose name no longer appears
    pub deletes: BTreeSet<SetId>,
    /// Sets with no stored counterpart
    pub inserts: Vec<VariableSet>,
    /// Stored set id → (stored set, new set)
    pub updates: BTreeMap<SetId, (VariableSet, VariableSet)>,
}

impl UpsertPlan {
    pub(crate) fn empty(page_id: PageId, old_rev_id: RevId, new_rev_id: RevId) -> Self {
        Self {
            page_id,
            old_rev_id,
            new_rev_id,
            ..Self::default()
        }
    }

    /// Number of set-level operations; zero means there is nothing to write
    pub fn total(&self) -> usize {
        self.deletes.len() + self.inserts.len() + self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
