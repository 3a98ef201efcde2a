use std::path::Path;

use predicates::prelude::predicate;
use serde_json::Value;
use tempfile::tempdir;

fn scaffold(root: &Path) {
    std::fs::create_dir_all(root.join("transcripts/router1")).expect("mkdir transcripts");
    write_transcript(root, "up");

    std::fs::write(
        root.join("tests.yml"),
        "tests:\n
         - command: show interfaces\n
           iterate: interfaces.*\n
           key: name\n
           checks:\n
           - operator: no-diff\n
             field: status\n
             message: \"status changed on {id}: {pre} -> {post}\"\n",
    )
    .expect("write tests");

    std::fs::write(
        root.join("main.yml"),
        "hosts:\n  - name: router1\n    source: transcripts/router1\ntests:\n  - tests.yml\nsnapshot_dir: snapshots\n",
    )
    .expect("write config");
}

fn write_transcript(root: &Path, status: &str) {
    std::fs::write(
        root.join("transcripts/router1/show_interfaces.json"),
        format!(r#"{{"interfaces": [{{"name": "ge-0/0/0", "status": "{status}"}}]}}"#),
    )
    .expect("write transcript");
}

fn snap(root: &Path, label: &str) {
    assert_cmd::cargo::cargo_bin_cmd!("snapq")
        .current_dir(root)
        .args(["snap", label])
        .assert()
        .code(0);
}

#[test]
fn unchanged_snapshots_pass() {
    let dir = tempdir().expect("tempdir");
    scaffold(dir.path());
    snap(dir.path(), "pre");
    snap(dir.path(), "post");

    assert_cmd::cargo::cargo_bin_cmd!("snapq")
        .current_dir(dir.path())
        .args(["check", "pre", "post"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("overall: PASSED"));
}

#[test]
fn changed_status_fails_with_the_message_template() {
    let dir = tempdir().expect("tempdir");
    scaffold(dir.path());
    snap(dir.path(), "pre");
    write_transcript(dir.path(), "down");
    snap(dir.path(), "post");

    assert_cmd::cargo::cargo_bin_cmd!("snapq")
        .current_dir(dir.path())
        .args(["check", "pre", "post"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains(
            "status changed on ge-0/0/0: up -> down",
        ))
        .stdout(predicate::str::contains("overall: FAILED"));
}

#[test]
fn json_mode_emits_the_report_tree() {
    let dir = tempdir().expect("tempdir");
    scaffold(dir.path());
    snap(dir.path(), "pre");
    snap(dir.path(), "post");

    let output = assert_cmd::cargo::cargo_bin_cmd!("snapq")
        .current_dir(dir.path())
        .args(["check", "pre", "post", "--json"])
        .assert()
        .code(0)
        .get_output()
        .clone();

    let payload: Value = serde_json::from_slice(&output.stdout).expect("stdout json");
    assert_eq!(payload["overall"], "passed");
    assert_eq!(payload["hosts"][0]["host"], "router1");
    assert_eq!(payload["hosts"][0]["commands"][0]["command"], "show interfaces");
}

#[test]
fn snapcheck_captures_and_evaluates_in_one_step() {
    let dir = tempdir().expect("tempdir");
    scaffold(dir.path());
    std::fs::write(
        dir.path().join("tests.yml"),
        "tests:\n
         - command: show interfaces\n
           iterate: interfaces.*\n
           key: name\n
           checks:\n
           - operator: is-equal\n
             field: status\n
             value: up\n",
    )
    .expect("write tests");

    assert_cmd::cargo::cargo_bin_cmd!("snapq")
        .current_dir(dir.path())
        .args(["snapcheck", "now"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("overall: PASSED"));
    assert!(dir.path().join("snapshots/router1/now.json").is_file());
}

#[test]
fn no_diff_in_snapcheck_is_a_configuration_failure() {
    let dir = tempdir().expect("tempdir");
    scaffold(dir.path());

    assert_cmd::cargo::cargo_bin_cmd!("snapq")
        .current_dir(dir.path())
        .args(["snapcheck", "now"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains(
            "no-diff requires pre and post snapshots",
        ));
}

#[test]
fn missing_snapshot_label_is_a_capture_failure() {
    let dir = tempdir().expect("tempdir");
    scaffold(dir.path());
    snap(dir.path(), "pre");

    let output = assert_cmd::cargo::cargo_bin_cmd!("snapq")
        .current_dir(dir.path())
        .args(["check", "pre", "post", "--json"])
        .assert()
        .code(2)
        .get_output()
        .clone();

    let payload: Value = serde_json::from_slice(&output.stdout).expect("stdout json");
    assert_eq!(payload["failed"], 0);
    assert_eq!(payload["capture_failures"][0]["host"], "router1");
}
