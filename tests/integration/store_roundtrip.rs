use serde_json::json;
use snapq::domain::snapshot::Snapshot;
use snapq::store::{DirStore, SnapshotStore, StoreError};
use tempfile::tempdir;

#[test]
fn snapshot_round_trips_with_metadata_intact() {
    let dir = tempdir().expect("tempdir");
    let store = DirStore::new(dir.path());

    let mut snapshot = Snapshot::new("edge router 1", "pre upgrade");
    snapshot.insert("show interfaces", json!({"interfaces": [{"name": "ge-0/0/0"}]}));
    snapshot.insert("show system", json!({"cpu": {"load": 3}}));
    store.put(&snapshot).expect("put");

    let loaded = store.get("edge router 1", "pre upgrade").expect("get");
    assert_eq!(loaded.host, "edge router 1");
    assert_eq!(loaded.label, "pre upgrade");
    assert_eq!(loaded.taken_at, snapshot.taken_at);
    assert_eq!(loaded.commands, snapshot.commands);
}

#[test]
fn names_with_spaces_slug_into_host_directories() {
    let dir = tempdir().expect("tempdir");
    let store = DirStore::new(dir.path());

    store
        .put(&Snapshot::new("edge router 1", "pre upgrade"))
        .expect("put");
    assert!(dir.path().join("edge_router_1/pre_upgrade.json").is_file());
}

#[test]
fn labels_with_underscores_stay_isolated_between_hosts() {
    let dir = tempdir().expect("tempdir");
    let store = DirStore::new(dir.path());

    let mut first = Snapshot::new("a", "b_c");
    first.insert("show system", json!({"cpu": 1}));
    store.put(&first).expect("put first");
    let mut second = Snapshot::new("a_b", "c");
    second.insert("show system", json!({"cpu": 2}));
    store.put(&second).expect("put second");

    assert_eq!(store.get("a", "b_c").expect("first key"), first);
    assert_eq!(store.get("a_b", "c").expect("second key"), second);
}

#[test]
fn rewriting_a_label_replaces_the_previous_snapshot() {
    let dir = tempdir().expect("tempdir");
    let store = DirStore::new(dir.path());

    let mut first = Snapshot::new("router1", "pre");
    first.insert("show system", json!({"cpu": {"load": 1}}));
    store.put(&first).expect("put first");

    let mut second = Snapshot::new("router1", "pre");
    second.insert("show system", json!({"cpu": {"load": 2}}));
    store.put(&second).expect("put second");

    let loaded = store.get("router1", "pre").expect("get");
    assert_eq!(
        loaded.document("show system"),
        Some(&json!({"cpu": {"load": 2}}))
    );
}

#[test]
fn corrupt_snapshot_file_is_a_parse_error() {
    let dir = tempdir().expect("tempdir");
    let store = DirStore::new(dir.path());
    std::fs::create_dir_all(dir.path().join("router1")).expect("mkdir");
    std::fs::write(dir.path().join("router1/pre.json"), "not json").expect("write");

    let error = store.get("router1", "pre").expect_err("must fail");
    assert!(matches!(error, StoreError::Parse { .. }));
}
