use predicates::prelude::predicate;
use serde_json::Value;
use tempfile::tempdir;

fn parse_stderr_json_lines(stderr: &[u8]) -> Vec<Value> {
    let text = String::from_utf8(stderr.to_vec()).expect("stderr utf8");
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("stderr json line"))
        .collect()
}

#[test]
fn help_is_available() {
    assert_cmd::cargo::cargo_bin_cmd!("snapq")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("snap"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("snapcheck"))
        .stdout(predicate::str::contains("diff"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn version_is_available() {
    assert_cmd::cargo::cargo_bin_cmd!("snapq")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_subcommand_exits_three_with_json_stderr() {
    let output = assert_cmd::cargo::cargo_bin_cmd!("snapq")
        .arg("frobnicate")
        .assert()
        .code(3)
        .get_output()
        .clone();

    let lines = parse_stderr_json_lines(&output.stderr);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["error"], "input_usage_error");
    assert_eq!(lines[0]["code"], 3);
}

#[test]
fn missing_config_file_exits_three() {
    let dir = tempdir().expect("tempdir");
    let output = assert_cmd::cargo::cargo_bin_cmd!("snapq")
        .current_dir(dir.path())
        .args(["check", "pre", "post"])
        .assert()
        .code(3)
        .get_output()
        .clone();

    let lines = parse_stderr_json_lines(&output.stderr);
    assert_eq!(lines[0]["error"], "input_usage_error");
    assert!(
        lines[0]["message"]
            .as_str()
            .expect("message string")
            .contains("main.yml")
    );
}
