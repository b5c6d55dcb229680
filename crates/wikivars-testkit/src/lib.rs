//! Test utilities for wikivars
//!
//! This crate provides shared testing utilities used across the wikivars workspace.

use tempfile::TempDir;
use wikivars_core::frame::{FrameArgs, FrameId, FrameTree};
use wikivars_core::gateway::PersistenceGateway;
use wikivars_core::set::{PageId, RevId, SetCollection};
use wikivars_core::upsert::{ApplyReport, plan};
use wikivars_core::variable::Variable;

/// Creates a temporary directory within `.tmp/` at the project root
///
/// This ensures all test temporary files are centralized in a single location
/// that is gitignored and easy to clean up manually if needed.
///
/// # Panics
///
/// Panics if:
/// - Unable to determine current directory
/// - Unable to create `.tmp/` directory
/// - Unable to create temporary subdirectory
///
/// # Examples
///
/// ```rust
/// use wikivars_testkit::temp_dir_in_workspace;
///
/// let temp = temp_dir_in_workspace();
/// let store = temp.path().join("store");
/// std::fs::create_dir_all(&store).unwrap();
/// // Cleanup happens automatically when temp is dropped
/// ```
pub fn temp_dir_in_workspace() -> TempDir {
    try_temp_dir_in_workspace().expect("Failed to create temporary directory in .tmp/")
}

/// Alternative with Result for non-test code
pub fn try_temp_dir_in_workspace() -> std::io::Result<TempDir> {
    let workspace_root = std::env::current_dir()?;
    let tmp_base = workspace_root.join(".tmp");
    std::fs::create_dir_all(&tmp_base)?;
    TempDir::new_in(&tmp_base)
}

/// Build a collection from `(set name, [(variable, value)])` pairs
///
/// ```rust
/// use wikivars_testkit::collection;
///
/// let c = collection(1, 10, &[("", &[("a", "1")]), ("stats", &[("hp", "5")])]);
/// assert_eq!(c.sets.len(), 2);
/// ```
pub fn collection(
    page_id: PageId,
    rev_id: RevId,
    sets: &[(&str, &[(&str, &str)])],
) -> SetCollection {
    let mut collection = SetCollection::new(page_id, rev_id);
    for (set_name, variables) in sets {
        let set = collection.set_mut(set_name);
        for (name, value) in variables.iter() {
            set.insert(name, Variable::text(*value));
        }
    }
    collection
}

/// Store `collection` as the new state of its page, planning against
/// whatever the gateway already holds
///
/// # Panics
///
/// Panics if the gateway fails.
pub fn seed<G: PersistenceGateway>(gateway: &G, collection: &SetCollection) -> ApplyReport {
    let old = gateway
        .load_sets(collection.page_id)
        .expect("Failed to load stored sets");
    gateway
        .save_plan(&plan(old.as_ref(), Some(collection)))
        .expect("Failed to save plan")
}

/// A page frame with template frames nested beneath it, one per title
///
/// Returns the tree and the frame ids from the page down to the innermost
/// template.
///
/// # Panics
///
/// Never in practice: each child is pushed under a frame just created.
pub fn frame_chain(page: &str, templates: &[&str]) -> (FrameTree, Vec<FrameId>) {
    let mut tree = FrameTree::new(page);
    let mut ids = vec![tree.root()];
    for title in templates {
        let parent = *ids.last().expect("chain always has a root");
        let id = tree
            .push_child(parent, *title, FrameArgs::new())
            .expect("parent frame exists");
        ids.push(id);
    }
    (tree, ids)
}
