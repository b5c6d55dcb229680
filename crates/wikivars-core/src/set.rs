//! Variable sets and per-page set collections

use crate::config::consts::keys::MAX_KEY_CHARS;
use crate::variable::Variable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type PageId = u64;
pub type RevId = u64;
pub type SetId = u64;

/// Cut a set or variable name to the width storage keys allow
pub fn truncate_key(name: &str) -> String {
    match name.char_indices().nth(MAX_KEY_CHARS) {
        Some((end, _)) => name[..end].to_string(),
        None => name.to_string(),
    }
}

/// Variables saved together under one name. The empty name is the default set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSet {
    pub name: String,
    #[serde(default)]
    pub variables: BTreeMap<String, Variable>,
    /// Storage identity; `None` until persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_id: Option<SetId>,
}

impl VariableSet {
    pub fn new(name: &str) -> Self {
        Self {
            name: truncate_key(name),
            variables: BTreeMap::new(),
            set_id: None,
        }
    }

    /// Add or replace a variable; the name is truncated to the key width
    pub fn insert(&mut self, name: &str, variable: Variable) {
        self.variables.insert(truncate_key(name), variable);
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Same name and same variables; storage identity is ignored
    pub fn same_variables(&self, other: &VariableSet) -> bool {
        self.name == other.name && self.variables == other.variables
    }
}

/// All sets of one page, either accumulated by a render or loaded from storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetCollection {
    pub page_id: PageId,
    pub rev_id: RevId,
    #[serde(default)]
    pub sets: BTreeMap<String, VariableSet>,
    /// Persisted identifiers by set name
    #[serde(default)]
    pub set_ids: BTreeMap<String, SetId>,
}

impl SetCollection {
    pub fn new(page_id: PageId, rev_id: RevId) -> Self {
        Self {
            page_id,
            rev_id,
            sets: BTreeMap::new(),
            set_ids: BTreeMap::new(),
        }
    }

    /// The set called `name`, created empty on first use
    pub fn set_mut(&mut self, name: &str) -> &mut VariableSet {
        let key = truncate_key(name);
        self.sets
            .entry(key.clone())
            .or_insert_with(|| VariableSet::new(&key))
    }

    pub fn get(&self, name: &str) -> Option<&VariableSet> {
        self.sets.get(&truncate_key(name))
    }

    /// Register a persisted set together with its identifier
    pub fn insert_persisted(&mut self, set_id: SetId, mut set: VariableSet) {
        set.set_id = Some(set_id);
        self.set_ids.insert(set.name.clone(), set_id);
        self.sets.insert(set.name.clone(), set);
    }

    pub fn variable(&self, set_name: &str, name: &str) -> Option<&Variable> {
        self.get(set_name)?.get(&truncate_key(name))
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Structural equality of the set maps: same names, same variables
    pub fn same_sets(&self, other: &SetCollection) -> bool {
        self.sets.len() == other.sets.len()
            && self
                .sets
                .iter()
                .zip(other.sets.iter())
                .all(|((a_name, a), (b_name, b))| a_name == b_name && a.same_variables(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_key_counts_chars() {
        let long = "x".repeat(60);
        assert_eq!(truncate_key(&long).chars().count(), MAX_KEY_CHARS);

        let wide = "é".repeat(60);
        let cut = truncate_key(&wide);
        assert_eq!(cut.chars().count(), MAX_KEY_CHARS);
        assert_eq!(cut.len(), MAX_KEY_CHARS * 2);

        assert_eq!(truncate_key("short"), "short");
    }

    #[test]
    fn test_insert_truncates_variable_names() {
        let mut set = VariableSet::new("");
        set.insert(&"v".repeat(70), Variable::text("1"));
        assert!(set.get(&"v".repeat(MAX_KEY_CHARS)).is_some());
    }

    #[test]
    fn test_set_mut_creates_once() {
        let mut collection = SetCollection::new(1, 10);
        collection.set_mut("stats").insert("hp", Variable::text("5"));
        collection.set_mut("stats").insert("mp", Variable::text("3"));
        assert_eq!(collection.sets.len(), 1);
        assert_eq!(collection.get("stats").unwrap().len(), 2);
    }

    #[test]
    fn test_same_sets_ignores_ids() {
        let mut a = SetCollection::new(1, 10);
        a.set_mut("").insert("a", Variable::text("1"));

        let mut b = SetCollection::new(1, 11);
        let mut stored = VariableSet::new("");
        stored.insert("a", Variable::text("1"));
        b.insert_persisted(7, stored);

        assert!(a.same_sets(&b));

        b.set_mut("").insert("a", Variable::new("1", true));
        assert!(!a.same_sets(&b));
    }
}
