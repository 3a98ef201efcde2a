use serde_json::json;
use snapq::domain::report::{Overall, ResultKind, Verdict};
use snapq::domain::snapshot::Snapshot;
use snapq::domain::testspec::{self, TestSuite};
use snapq::engine::aggregate::{aggregate_host, aggregate_run};
use snapq::engine::eval::{SnapshotPair, evaluate};
use tempfile::tempdir;

fn suite_from(text: &str) -> TestSuite {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("tests.yml");
    std::fs::write(&path, text).expect("write tests");
    testspec::load(&path).expect("load suite")
}

fn snapshot(label: &str, command: &str, document: serde_json::Value) -> Snapshot {
    let mut snapshot = Snapshot::new("router1", label);
    snapshot.insert(command, document);
    snapshot
}

#[test]
fn load_evaluate_aggregate_pass_flow() {
    let suite = suite_from(
        "tests:\n
         - command: show interfaces\n
           iterate: interfaces.*\n
           key: name\n
           checks:\n
           - operator: no-diff\n
             field: status\n
           - operator: is-in\n
             field: status\n
             value: [up, down]\n",
    );
    let document = json!({"interfaces": [
        {"name": "ge-0/0/0", "status": "up"},
        {"name": "ge-0/0/1", "status": "down"}
    ]});
    let pre = snapshot("pre", "show interfaces", document.clone());
    let post = snapshot("post", "show interfaces", document);

    let results = evaluate(&suite, SnapshotPair::pre_post(&pre, &post));
    let host = aggregate_host("router1", results);
    let run = aggregate_run(vec![host], Vec::new());

    assert_eq!(run.overall, Overall::Passed);
    assert_eq!(run.passed, 4);
    assert_eq!(run.failed, 0);
    assert_eq!(run.hosts[0].commands.len(), 1);
}

#[test]
fn mixed_verdicts_fail_the_run_and_keep_every_result() {
    let suite = suite_from(
        "tests:\n
         - command: show system\n
           checks:\n
           - operator: is-lt\n
             field: cpu.load\n
             value: 80\n
           - operator: in-range\n
             field: memory.used\n
             value: [0, 50]\n",
    );
    let current = snapshot(
        "now",
        "show system",
        json!({"cpu": {"load": 42}, "memory": {"used": 90}}),
    );

    let results = evaluate(&suite, SnapshotPair::single(&current));
    let run = aggregate_run(vec![aggregate_host("router1", results)], Vec::new());

    assert_eq!(run.overall, Overall::Failed);
    assert_eq!(run.passed, 1);
    assert_eq!(run.failed, 1);
    assert_eq!(run.overall.exit_code(), 2);
}

#[test]
fn rejected_block_flows_through_as_configuration_failure() {
    let suite = suite_from(
        "tests:\n
         - command: show system\n
           checks:\n
           - operator: is-fuzzy\n
             field: cpu.load\n
             value: 80\n
         - command: show chassis\n
           checks:\n
           - operator: list-not-empty\n
             field: fans\n",
    );
    let mut current = Snapshot::new("router1", "now");
    current.insert("show chassis", json!({"fans": [1, 2]}));

    let results = evaluate(&suite, SnapshotPair::single(&current));
    let host = aggregate_host("router1", results);

    assert_eq!(host.commands[0].command, "show system");
    assert_eq!(host.commands[0].failed, 1);
    assert_eq!(host.commands[0].results[0].kind, ResultKind::Configuration);
    assert_eq!(host.commands[1].passed, 1);
}

#[test]
fn capture_failure_fails_the_run_without_counting_as_a_test() {
    let suite = suite_from(
        "tests:\n
         - command: show system\n
           checks:\n
           - operator: exists\n
             field: cpu\n",
    );
    let current = snapshot("now", "show system", json!({"cpu": {"load": 1}}));
    let results = evaluate(&suite, SnapshotPair::single(&current));
    assert!(results.iter().all(|result| result.verdict == Verdict::Pass));

    let run = aggregate_run(
        vec![aggregate_host("router1", results)],
        vec![snapq::domain::report::CaptureFailure {
            host: "router2".to_string(),
            reason: "connection refused".to_string(),
        }],
    );
    assert_eq!(run.overall, Overall::Failed);
    assert_eq!(run.failed, 0);
}

#[test]
fn empty_suite_reports_no_tests() {
    let current = snapshot("now", "show system", json!({}));
    let results = evaluate(&TestSuite::default(), SnapshotPair::single(&current));
    assert!(results.is_empty());

    let run = aggregate_run(vec![aggregate_host("router1", results)], Vec::new());
    assert_eq!(run.overall, Overall::NoTests);
    assert_eq!(run.overall.exit_code(), 2);
}
