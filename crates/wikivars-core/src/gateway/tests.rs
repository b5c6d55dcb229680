use super::*;
use crate::error::VarsError;
use crate::upsert::plan;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

fn collection(page_id: PageId, rev_id: u64, sets: &[(&str, &[(&str, &str)])]) -> SetCollection {
    let mut c = SetCollection::new(page_id, rev_id);
    for (set_name, vars) in sets {
        let set = c.set_mut(set_name);
        for (name, value) in *vars {
            set.insert(name, Variable::text(*value));
        }
    }
    c
}

/// Plan `new` against what `gateway` holds and save it
fn store<G: PersistenceGateway>(gateway: &G, new: &SetCollection) -> ApplyReport {
    let old = gateway.load_sets(new.page_id).unwrap();
    gateway.save_plan(&plan(old.as_ref(), Some(new))).unwrap()
}

fn exercise_gateway<G: PersistenceGateway>(gateway: &G) {
    assert!(gateway.load_sets(1).unwrap().is_none());
    assert!(gateway.load_filtered(1, "", &[]).unwrap().is_none());

    let first = collection(1, 10, &[("", &[("a", "1")]), ("s1", &[("b", "2")])]);
    let report = store(gateway, &first);
    assert_eq!(report.inserted_sets, 2);

    let loaded = gateway.load_sets(1).unwrap().unwrap();
    assert!(loaded.same_sets(&first));
    assert_eq!(loaded.rev_id, 10);
    assert_eq!(loaded.set_ids.len(), 2);

    let second = collection(1, 11, &[("", &[("a", "1")]), ("s2", &[("c", "3")])]);
    let report = store(gateway, &second);
    assert_eq!(report.deleted_sets, 1);
    assert_eq!(report.inserted_sets, 1);
    assert_eq!(report.updated_sets, 1);
    assert_eq!(report.rows_updated, 0);

    let vars = gateway.load_filtered(1, "s2", &[]).unwrap().unwrap();
    assert_eq!(vars["c"], Variable::text("3"));
    assert!(gateway.load_filtered(1, "s1", &[]).unwrap().is_none());

    // Nothing changed: nothing is written
    let report = store(gateway, &second);
    assert_eq!(report, ApplyReport::default());

    assert!(gateway.delete_all(1).unwrap());
    assert!(!gateway.delete_all(1).unwrap());
    assert!(gateway.load_sets(1).unwrap().is_none());
}

#[test]
fn test_memory_gateway() {
    exercise_gateway(&MemoryGateway::new());
}

#[test]
fn test_json_store() {
    let temp = TempDir::new().unwrap();
    exercise_gateway(&JsonStore::new(temp.path().join("store")));
}

#[test]
fn test_gateway_by_reference() {
    let gateway = MemoryGateway::new();
    let by_ref: &MemoryGateway = &gateway;
    store(&by_ref, &collection(4, 1, &[("", &[("a", "1")])]));
    assert_eq!(gateway.page_ids(), vec![4]);
}

#[test]
fn test_deleting_every_set_drops_the_page() {
    let gateway = MemoryGateway::new();
    let c = collection(2, 1, &[("x", &[("a", "1")])]);
    store(&gateway, &c);

    let stored = gateway.load_sets(2).unwrap();
    gateway.save_plan(&plan(stored.as_ref(), None)).unwrap();
    assert!(gateway.record(2).is_none());
}

#[test]
fn test_json_store_layout_and_listing() {
    let temp = TempDir::new().unwrap();
    let gateway = JsonStore::new(temp.path());
    assert!(gateway.pages().unwrap().is_empty());

    store(&gateway, &collection(20, 1, &[("", &[("a", "1")])]));
    store(&gateway, &collection(3, 1, &[("", &[("a", "1")])]));
    std::fs::write(temp.path().join("pages").join("notes.txt"), "ignored").unwrap();

    assert!(gateway.page_path(3).exists());
    assert!(temp.path().join("store.lock").exists());
    assert_eq!(gateway.pages().unwrap(), vec![3, 20]);
}

#[test]
fn test_json_store_missing_root_reads_as_empty() {
    let temp = TempDir::new().unwrap();
    let gateway = JsonStore::new(temp.path().join("never-created"));
    assert!(gateway.load_sets(1).unwrap().is_none());
    assert!(!gateway.delete_all(1).unwrap());
    assert!(!gateway.root().exists());
}

#[test]
fn test_json_store_corrupt_record() {
    let temp = TempDir::new().unwrap();
    let gateway = JsonStore::new(temp.path());
    std::fs::create_dir_all(temp.path().join("pages")).unwrap();
    std::fs::write(gateway.page_path(5), "{ not json").unwrap();

    let err = gateway.load_sets(5).unwrap_err();
    assert!(matches!(err, VarsError::StoreCorrupt { .. }));
    assert!(err.to_string().starts_with("STORE_CORRUPT"));
}

#[test]
fn test_json_store_record_for_wrong_page() {
    let temp = TempDir::new().unwrap();
    let gateway = JsonStore::new(temp.path());
    store(&gateway, &collection(6, 1, &[("", &[("a", "1")])]));
    std::fs::copy(gateway.page_path(6), gateway.page_path(7)).unwrap();

    assert!(matches!(
        gateway.load_sets(7),
        Err(VarsError::StoreCorrupt { .. })
    ));
}

#[test]
fn test_json_store_from_config() {
    let temp = TempDir::new().unwrap();
    let config = crate::config::StoreConfig {
        path: temp.path().join("cfg-store"),
        lock_timeout_ms: 100,
        read_lock_timeout_ms: 100,
    };
    let gateway = JsonStore::from_config(&config);
    assert_eq!(gateway.root(), config.path.as_path());
}

#[test]
fn test_json_store_concurrent_writers() {
    let temp = TempDir::new().unwrap();
    let root = Arc::new(temp.path().to_path_buf());
    let barrier = Arc::new(Barrier::new(4));

    let handles: Vec<_> = (0..4u64)
        .map(|i| {
            let root = Arc::clone(&root);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let gateway = JsonStore::new(root.as_path());
                let set = format!("writer{}", i);
                let mut new = SetCollection::new(9, i + 1);
                new.set_mut(&set).insert("v", Variable::text(i.to_string()));

                barrier.wait();
                // Only this writer's set is planned, so concurrent writers never delete each other's
                let p = plan(None, Some(&new));
                gateway.save_plan(&p).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let gateway = JsonStore::new(root.as_path());
    let loaded = gateway.load_sets(9).unwrap().unwrap();
    assert_eq!(loaded.sets.len(), 4);
    for i in 0..4u64 {
        let name = format!("writer{}", i);
        assert_eq!(
            loaded.variable(&name, "v"),
            Some(&Variable::text(i.to_string()))
        );
    }
}
