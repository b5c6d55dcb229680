//! Applying a plan to the stored representation of a page

use super::diff::{diff_variables, VariableDiff};
use super::UpsertPlan;
use crate::set::{truncate_key, PageId, RevId, SetCollection, SetId, VariableSet};
use crate::variable::Variable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One stored set row with its variable rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSet {
    pub name: String,
    pub rev_id: RevId,
    #[serde(default)]
    pub variables: BTreeMap<String, Variable>,
}

/// Everything stored for one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page_id: PageId,
    #[serde(default)]
    pub sets: BTreeMap<SetId, StoredSet>,
    #[serde(default = "first_set_id")]
    pub next_set_id: SetId,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn first_set_id() -> SetId {
    1
}

impl PageRecord {
    pub fn new(page_id: PageId) -> Self {
        Self {
            page_id,
            sets: BTreeMap::new(),
            next_set_id: first_set_id(),
            updated_at: None,
        }
    }

    /// The stored sets as a collection; its revision is the newest set revision
    pub fn to_collection(&self) -> SetCollection {
        let rev_id = self.sets.values().map(|s| s.rev_id).max().unwrap_or_default();
        let mut collection = SetCollection::new(self.page_id, rev_id);
        for (id, stored) in &self.sets {
            collection.insert_persisted(
                *id,
                VariableSet {
                    name: stored.name.clone(),
                    variables: stored.variables.clone(),
                    set_id: Some(*id),
                },
            );
        }
        collection
    }

    /// Variables of `set_name` restricted to `names`; every variable of the
    /// set when `names` is empty. `None` when the set is not stored.
    pub fn filtered(&self, set_name: &str, names: &[String]) -> Option<BTreeMap<String, Variable>> {
        let set_name = truncate_key(set_name);
        let stored = self.sets.values().find(|s| s.name == set_name)?;
        if names.is_empty() {
            return Some(stored.variables.clone());
        }
        Some(
            names
                .iter()
                .filter_map(|n| {
                    let key = truncate_key(n);
                    stored.variables.get(&key).map(|v| (key, v.clone()))
                })
                .collect(),
        )
    }

    fn set_id_by_name(&self, name: &str) -> Option<SetId> {
        self.sets
            .iter()
            .find(|(_, s)| s.name == name)
            .map(|(id, _)| *id)
    }

    fn allocate_set_id(&mut self) -> SetId {
        let id = self.next_set_id;
        self.next_set_id += 1;
        id
    }
}

/// What applying a plan did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub deleted_sets: usize,
    pub inserted_sets: usize,
    pub updated_sets: usize,
    pub rows_inserted: usize,
    pub rows_updated: usize,
    pub rows_deleted: usize,
    /// Sets whose rows were written but whose stored revision was already
    /// at or beyond the plan's revision
    pub stale_sets: BTreeSet<SetId>,
}

impl ApplyReport {
    fn count_rows(&mut self, diff: &VariableDiff) {
        self.rows_inserted += diff.inserts.len();
        self.rows_updated += diff.updates.len();
        self.rows_deleted += diff.deletes.len();
    }
}

/// Write `plan` into `record`: deletes, then inserts, then updates.
pub fn apply_plan(record: &mut PageRecord, plan: &UpsertPlan) -> ApplyReport {
    let mut report = ApplyReport::default();

    for id in &plan.deletes {
        if let Some(stored) = record.sets.remove(id) {
            report.deleted_sets += 1;
            report.rows_deleted += stored.variables.len();
        }
    }

    for set in &plan.inserts {
        // Another writer may have created the same set since the plan was made
        if let Some(id) = record.set_id_by_name(&set.name) {
            let current = stored_as_set(record, id);
            update_set(record, id, &current, set, plan.new_rev_id, &mut report);
            continue;
        }

        let id = record.allocate_set_id();
        record.sets.insert(
            id,
            StoredSet {
                name: set.name.clone(),
                rev_id: plan.new_rev_id,
                variables: set.variables.clone(),
            },
        );
        report.inserted_sets += 1;
        report.rows_inserted += set.variables.len();
    }

    for (id, (old, new)) in &plan.updates {
        if record.sets.contains_key(id) {
            update_set(record, *id, old, new, plan.new_rev_id, &mut report);
        } else {
            tracing::warn!(page_id = plan.page_id, set_id = id, "updated set vanished; storing anew");
            let fresh = record.allocate_set_id();
            record.sets.insert(
                fresh,
                StoredSet {
                    name: new.name.clone(),
                    rev_id: plan.new_rev_id,
                    variables: new.variables.clone(),
                },
            );
            report.inserted_sets += 1;
            report.rows_inserted += new.variables.len();
        }
    }

    if plan.total() > 0 {
        record.updated_at = Some(Utc::now());
    }
    report
}

fn stored_as_set(record: &PageRecord, id: SetId) -> VariableSet {
    let stored = &record.sets[&id];
    VariableSet {
        name: stored.name.clone(),
        variables: stored.variables.clone(),
        set_id: Some(id),
    }
}

fn update_set(
    record: &mut PageRecord,
    id: SetId,
    old: &VariableSet,
    new: &VariableSet,
    new_rev_id: RevId,
    report: &mut ApplyReport,
) {
    let Some(stored) = record.sets.get_mut(&id) else {
        return;
    };

    let diff = diff_variables(old, new);
    diff.apply_to(&mut stored.variables);
    report.count_rows(&diff);
    report.updated_sets += 1;

    if new_rev_id > stored.rev_id {
        stored.rev_id = new_rev_id;
    } else if new_rev_id < stored.rev_id || !diff.is_empty() {
        tracing::warn!(
            set_id = id,
            stored_rev = stored.rev_id,
            plan_rev = new_rev_id,
            "stale write: keeping stored revision"
        );
        report.stale_sets.insert(id);
    }
}
