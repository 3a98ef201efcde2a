use predicates::prelude::predicate;
use tempfile::tempdir;

#[test]
fn init_scaffolds_the_working_directory() {
    let dir = tempdir().expect("tempdir");

    assert_cmd::cargo::cargo_bin_cmd!("snapq")
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("created"));

    assert!(dir.path().join("snapshots").is_dir());
    assert!(dir.path().join("configs/tests.yml").is_file());
    assert!(dir.path().join("main.yml").is_file());
}

#[test]
fn init_keeps_existing_files_unless_overwritten() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(dir.path().join("main.yml"), "custom: true\n").expect("write main");

    assert_cmd::cargo::cargo_bin_cmd!("snapq")
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("kept existing"));
    let kept = std::fs::read_to_string(dir.path().join("main.yml")).expect("read main");
    assert_eq!(kept, "custom: true\n");

    assert_cmd::cargo::cargo_bin_cmd!("snapq")
        .current_dir(dir.path())
        .args(["init", "--overwrite"])
        .assert()
        .code(0);
    let replaced = std::fs::read_to_string(dir.path().join("main.yml")).expect("read main");
    assert!(replaced.contains("hosts:"));
}

#[test]
fn scaffolded_config_parses_back() {
    let dir = tempdir().expect("tempdir");

    assert_cmd::cargo::cargo_bin_cmd!("snapq")
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .code(0);

    let config = snapq::domain::config::load(&dir.path().join("main.yml")).expect("load config");
    assert_eq!(config.hosts[0].name, "router1");
    let suite =
        snapq::domain::testspec::load(&dir.path().join("configs/tests.yml")).expect("load tests");
    assert_eq!(suite.commands(), vec!["show interfaces", "show system"]);
}
