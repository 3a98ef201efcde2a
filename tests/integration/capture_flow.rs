use serde_json::json;
use snapq::capture::{Capture, CaptureError, TranscriptCapture};
use snapq::domain::config::HostConfig;
use snapq::domain::snapshot::Snapshot;
use snapq::engine::eval::{SnapshotPair, evaluate};
use snapq::store::{DirStore, SnapshotStore};
use tempfile::tempdir;

#[test]
fn transcripts_capture_into_a_snapshot_that_evaluates() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("show_interfaces.json"),
        r#"{"interfaces": [{"name": "ge-0/0/0", "status": "up"}]}"#,
    )
    .expect("write json transcript");
    std::fs::write(dir.path().join("show_system.yml"), "cpu:\n  load: 42\n")
        .expect("write yaml transcript");

    let host = HostConfig {
        name: "router1".to_string(),
        source: dir.path().to_path_buf(),
    };
    let mut snapshot = Snapshot::new(&host.name, "now");
    for command in ["show interfaces", "show system"] {
        let document = TranscriptCapture.capture(&host, command).expect("capture");
        snapshot.insert(command, document);
    }

    assert_eq!(
        snapshot.document("show system"),
        Some(&json!({"cpu": {"load": 42}}))
    );

    let suite_dir = tempdir().expect("tempdir");
    let tests = suite_dir.path().join("tests.yml");
    std::fs::write(
        &tests,
        "tests:\n
         - command: show system\n
           checks:\n
           - operator: is-lt\n
             field: cpu.load\n
             value: 80\n",
    )
    .expect("write tests");
    let suite = snapq::domain::testspec::load(&tests).expect("load suite");

    let results = evaluate(&suite, SnapshotPair::single(&snapshot));
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].verdict, snapq::domain::report::Verdict::Pass);
}

#[test]
fn captured_snapshot_survives_the_store() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(dir.path().join("show_system.json"), r#"{"cpu": {"load": 7}}"#)
        .expect("write transcript");

    let host = HostConfig {
        name: "router1".to_string(),
        source: dir.path().to_path_buf(),
    };
    let mut snapshot = Snapshot::new(&host.name, "pre");
    let document = TranscriptCapture
        .capture(&host, "show system")
        .expect("capture");
    snapshot.insert("show system", document);

    let store_dir = tempdir().expect("tempdir");
    let store = DirStore::new(store_dir.path());
    store.put(&snapshot).expect("put");
    let loaded = store.get("router1", "pre").expect("get");
    assert_eq!(loaded, snapshot);
}

#[test]
fn missing_transcript_surfaces_as_capture_error() {
    let dir = tempdir().expect("tempdir");
    let host = HostConfig {
        name: "router1".to_string(),
        source: dir.path().to_path_buf(),
    };
    let error = TranscriptCapture
        .capture(&host, "show bgp")
        .expect_err("must fail");
    assert!(matches!(error, CaptureError::MissingTranscript { .. }));
    assert!(error.to_string().contains("show bgp"));
}
