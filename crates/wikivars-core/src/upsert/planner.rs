//! Set-level diff

use super::UpsertPlan;
use crate::set::{SetCollection, SetId};

/// Plan the writes that turn `old` (stored, if any) into `new` (rendered, if
/// any).
///
/// Sets present on both sides are always planned as updates, even when they
/// look unchanged; the variable-level diff decides whether rows get written.
pub fn plan(old: Option<&SetCollection>, new: Option<&SetCollection>) -> UpsertPlan {
    let page_id = new.or(old).map(|c| c.page_id).unwrap_or_default();
    let old_rev_id = old.map(|c| c.rev_id).unwrap_or_default();
    let new_rev_id = new.map(|c| c.rev_id).unwrap_or(old_rev_id);

    let empty = SetCollection::new(page_id, old_rev_id);
    let old = old.unwrap_or(&empty);
    let new = new.unwrap_or(&empty);

    let mut plan = UpsertPlan::empty(page_id, old_rev_id, new_rev_id);
    if old.same_sets(new) {
        tracing::debug!(page_id, "stored sets unchanged");
        return plan;
    }

    for name in old.sets.keys() {
        if !new.sets.contains_key(name) {
            match set_id_of(old, name) {
                Some(id) => {
                    plan.deletes.insert(id);
                }
                None => tracing::warn!(page_id, set = %name, "stored set has no id"),
            }
        }
    }

    for (name, new_set) in &new.sets {
        match (old.sets.get(name), set_id_of(old, name)) {
            (Some(old_set), Some(id)) => {
                plan.updates.insert(id, (old_set.clone(), new_set.clone()));
            }
            _ => plan.inserts.push(new_set.clone()),
        }
    }

    tracing::debug!(
        page_id,
        deletes = plan.deletes.len(),
        inserts = plan.inserts.len(),
        updates = plan.updates.len(),
        "planned set upsert"
    );
    plan
}

fn set_id_of(collection: &SetCollection, name: &str) -> Option<SetId> {
    collection
        .set_ids
        .get(name)
        .copied()
        .or_else(|| collection.sets.get(name).and_then(|s| s.set_id))
}
