use std::path::Path;

use predicates::prelude::predicate;
use serde_json::Value;
use tempfile::tempdir;

fn scaffold(root: &Path, cpu_load: u64) {
    let transcripts = root.join("transcripts/router1");
    std::fs::create_dir_all(&transcripts).expect("mkdir transcripts");
    std::fs::write(
        transcripts.join("show_system.json"),
        format!(r#"{{"cpu": {{"load": {cpu_load}}}}}"#),
    )
    .expect("write transcript");

    std::fs::write(
        root.join("tests.yml"),
        "tests:\n
         - command: show system\n
           checks:\n
           - operator: is-lt\n
             field: cpu.load\n
             value: 80\n",
    )
    .expect("write tests");

    std::fs::write(
        root.join("main.yml"),
        "hosts:\n  - name: router1\n    source: transcripts/router1\ntests:\n  - tests.yml\nsnapshot_dir: snapshots\n",
    )
    .expect("write config");
}

#[test]
fn snap_stores_a_labelled_snapshot_per_host() {
    let dir = tempdir().expect("tempdir");
    scaffold(dir.path(), 42);

    assert_cmd::cargo::cargo_bin_cmd!("snapq")
        .current_dir(dir.path())
        .args(["snap", "pre"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("stored snapshot `pre` for router1"));

    let stored = dir.path().join("snapshots/router1/pre.json");
    let raw = std::fs::read_to_string(&stored).expect("snapshot file");
    let snapshot: Value = serde_json::from_str(&raw).expect("snapshot json");
    assert_eq!(snapshot["host"], "router1");
    assert_eq!(snapshot["commands"]["show system"]["cpu"]["load"], 42);
}

#[test]
fn missing_transcript_exits_two() {
    let dir = tempdir().expect("tempdir");
    scaffold(dir.path(), 42);
    std::fs::remove_file(dir.path().join("transcripts/router1/show_system.json"))
        .expect("remove transcript");

    assert_cmd::cargo::cargo_bin_cmd!("snapq")
        .current_dir(dir.path())
        .args(["snap", "pre"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("capture failed for router1"));
}

#[test]
fn json_mode_reports_stored_hosts() {
    let dir = tempdir().expect("tempdir");
    scaffold(dir.path(), 42);

    let output = assert_cmd::cargo::cargo_bin_cmd!("snapq")
        .current_dir(dir.path())
        .args(["snap", "pre", "--json"])
        .assert()
        .code(0)
        .get_output()
        .clone();

    let payload: Value = serde_json::from_slice(&output.stdout).expect("stdout json");
    assert_eq!(payload["label"], "pre");
    assert_eq!(payload["stored"], serde_json::json!(["router1"]));
}
