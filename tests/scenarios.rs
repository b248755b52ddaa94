//! End-to-end persistence scenarios (spec.md §8, "End-to-end scenarios").
//! Exercises the real on-disk snapshot + WAL files through `StorageRuntime`,
//! matching the teacher's own integration-test style of driving a storage
//! stack via `tempfile` rather than mocking the filesystem.

use std::rc::Rc;

use configx::{StorageRuntime, Tree};

fn open(snapshot: &std::path::Path, wal: &std::path::Path) -> (Rc<StorageRuntime>, Tree) {
    let runtime = Rc::new(StorageRuntime::new(snapshot, wal).unwrap());
    let mut tree = Tree::new();
    tree.attach_hook(runtime.clone());
    runtime.start(&mut tree).unwrap();
    (runtime, tree)
}

#[test]
fn scenario_1_nested_set_and_get() {
    let mut t = Tree::new();
    t.set("app.ui.theme", "dark").unwrap();
    t.set("app.ui.fontSize", 14i64).unwrap();
    assert_eq!(
        t.get("app.ui").unwrap(),
        serde_json::json!({"theme": "dark", "fontSize": 14})
    );
}

#[test]
fn scenario_2_recovery_from_wal_with_no_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("state.cfgx");
    let wal = dir.path().join("state.wal");

    {
        let (_runtime, mut tree) = open(&snapshot, &wal);
        tree.set("app.ui.theme", "dark").unwrap();
        tree.set("app.ui.fontSize", 14i64).unwrap();
    }

    assert!(!snapshot.exists());

    let (_runtime, tree) = open(&snapshot, &wal);
    assert_eq!(
        tree.get("app.ui").unwrap(),
        serde_json::json!({"theme": "dark", "fontSize": 14})
    );
}

#[test]
fn scenario_3_checkpoint_then_more_mutations_then_restart() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("state.cfgx");
    let wal = dir.path().join("state.wal");

    {
        let (runtime, mut tree) = open(&snapshot, &wal);
        tree.set("app.ui.theme", "dark").unwrap();
        tree.set("app.ui.fontSize", 14i64).unwrap();
        runtime.checkpoint(&tree).unwrap();
        tree.set("c", 3i64).unwrap();
    }

    let (_runtime, tree) = open(&snapshot, &wal);
    assert_eq!(
        tree.to_dict(),
        serde_json::json!({"app": {"ui": {"theme": "dark", "fontSize": 14}}, "c": 3})
    );
}

#[test]
fn scenario_4_assigning_over_interior_node_fails_and_wal_stays_single_record() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("state.cfgx");
    let wal_path = dir.path().join("state.wal");

    let (_runtime, mut tree) = open(&snapshot, &wal_path);
    tree.set("app.ui.theme", "dark").unwrap();
    assert!(tree.set("app.ui", "red").is_err());

    let lines = std::fs::read_to_string(&wal_path).unwrap();
    assert_eq!(lines.lines().filter(|l| !l.trim().is_empty()).count(), 1);
}

#[test]
fn scenario_5_restart_does_not_grow_the_wal() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("state.cfgx");
    let wal_path = dir.path().join("state.wal");

    let before = {
        let (_runtime, mut tree) = open(&snapshot, &wal_path);
        tree.set("x", 10i64).unwrap();
        tree.set("y", 20i64).unwrap();
        std::fs::read_to_string(&wal_path).unwrap().lines().count()
    };

    let after = {
        let (_runtime, _tree) = open(&snapshot, &wal_path);
        std::fs::read_to_string(&wal_path).unwrap().lines().count()
    };

    assert_eq!(before, after);
}

#[test]
fn scenario_6_shutdown_checkpoints_and_empties_wal() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("state.cfgx");
    let wal_path = dir.path().join("state.wal");

    {
        let (runtime, mut tree) = open(&snapshot, &wal_path);
        tree.set("p", 100i64).unwrap();
        tree.set("q", 200i64).unwrap();
        runtime.shutdown(&tree).unwrap();
        assert_eq!(std::fs::read_to_string(&wal_path).unwrap().trim(), "");
    }

    let (_runtime, tree) = open(&snapshot, &wal_path);
    assert_eq!(tree.get("p").unwrap(), serde_json::json!(100));
    assert_eq!(tree.get("q").unwrap(), serde_json::json!(200));
}

#[test]
fn strict_mode_set_on_empty_tree_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("state.cfgx");
    let wal_path = dir.path().join("state.wal");

    let (_runtime, mut tree) = open(&snapshot, &wal_path);
    tree.set_strict_mode(true);

    assert!(tree.set("a.b.c", 1i64).is_err());
    assert_eq!(tree.to_dict(), serde_json::json!({}));
    assert_eq!(std::fs::read_to_string(&wal_path).unwrap().trim(), "");
}

#[test]
fn boundary_paths_normalize_or_reject_consistently() {
    let t = Tree::new();
    assert!(t.get("").is_err());
    assert!(t.get(".").is_err());
    assert!(t.get("  ").is_err());
    // "a..b" collapses to ["a", "b"]; neither exists, so it's a lookup miss
    // rather than a path-parsing failure.
    assert!(matches!(t.get("a..b"), Err(configx::Error::PathNotFound { .. })));
}
