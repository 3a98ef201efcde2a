use std::path::PathBuf;

use serde_json::json;

use crate::capture::{Capture, CaptureError};
use crate::cmd::{CommandOutput, load_setup};
use crate::domain::config::HostConfig;
use crate::domain::snapshot::Snapshot;
use crate::domain::testspec::TestSuite;
use crate::engine::runner;
use crate::store::SnapshotStore;

#[derive(Debug, Clone)]
pub struct SnapArgs {
    pub config: PathBuf,
    pub label: String,
}

/// Captures one snapshot per configured host and stores it under the label.
pub fn run(args: &SnapArgs) -> CommandOutput {
    run_with_capture(args, &crate::capture::TranscriptCapture)
}

pub fn run_with_capture(args: &SnapArgs, capture: &(impl Capture + Sync)) -> CommandOutput {
    let setup = match load_setup(&args.config) {
        Ok(setup) => setup,
        Err(message) => return CommandOutput::usage_error(message),
    };

    let outcomes = runner::run_hosts(&setup.config.hosts, setup.workers(), |host| {
        let result = capture_snapshot(capture, host, &setup.suite, &args.label)
            .map_err(|error| error.to_string())
            .and_then(|snapshot| {
                setup
                    .store
                    .put(&snapshot)
                    .map_err(|error| error.to_string())
            });
        (host.name.clone(), result)
    });

    let mut stored = Vec::new();
    let mut failures = Vec::new();
    for (host, result) in outcomes {
        match result {
            Ok(()) => stored.push(host),
            Err(reason) => failures.push((host, reason)),
        }
    }

    let mut text = String::new();
    for host in &stored {
        text.push_str(&format!("stored snapshot `{}` for {host}\n", args.label));
    }
    for (host, reason) in &failures {
        text.push_str(&format!("capture failed for {host}: {reason}\n"));
    }

    let exit_code = if failures.is_empty() { 0 } else { 2 };
    CommandOutput {
        exit_code,
        text,
        payload: json!({
            "label": args.label,
            "stored": stored,
            "failures": failures
                .iter()
                .map(|(host, reason)| json!({"host": host, "reason": reason}))
                .collect::<Vec<_>>(),
        }),
    }
}

/// Captures every command the suite references, in suite order. The snapshot
/// is only handed back complete; a failed command fails the whole host.
pub(crate) fn capture_snapshot(
    capture: &impl Capture,
    host: &HostConfig,
    suite: &TestSuite,
    label: &str,
) -> Result<Snapshot, CaptureError> {
    let mut snapshot = Snapshot::new(&host.name, label);
    for command in suite.commands() {
        let document = capture.capture(host, command)?;
        snapshot.insert(command, document);
    }
    Ok(snapshot)
}
