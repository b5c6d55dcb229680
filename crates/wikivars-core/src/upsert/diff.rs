//! Variable-level diff inside one updated set

use crate::set::VariableSet;
use crate::variable::Variable;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Row writes needed to turn one set's variables into another's
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariableDiff {
    pub inserts: BTreeMap<String, Variable>,
    pub updates: BTreeMap<String, Variable>,
    pub deletes: BTreeSet<String>,
}

impl VariableDiff {
    pub fn total(&self) -> usize {
        self.inserts.len() + self.updates.len() + self.deletes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub(crate) fn apply_to(&self, rows: &mut BTreeMap<String, Variable>) {
        for name in &self.deletes {
            rows.remove(name);
        }
        for (name, var) in self.inserts.iter().chain(self.updates.iter()) {
            rows.insert(name.clone(), var.clone());
        }
    }
}

/// Compare two sets variable by variable.
///
/// A value counts as changed when its text or its parse-on-load flag differs.
pub fn diff_variables(old: &VariableSet, new: &VariableSet) -> VariableDiff {
    let mut diff = VariableDiff::default();

    for (name, old_var) in &old.variables {
        match new.variables.get(name) {
            Some(new_var) if new_var != old_var => {
                diff.updates.insert(name.clone(), new_var.clone());
            }
            Some(_) => {}
            None => {
                diff.deletes.insert(name.clone());
            }
        }
    }

    for (name, new_var) in &new.variables {
        if !old.variables.contains_key(name) {
            diff.inserts.insert(name.clone(), new_var.clone());
        }
    }

    diff
}
