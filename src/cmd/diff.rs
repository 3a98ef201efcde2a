use std::path::PathBuf;

use serde_json::json;

use crate::cmd::{CommandOutput, load_config};
use crate::engine::diff::{self, SnapshotDiff};
use crate::render;
use crate::store::{DirStore, SnapshotStore};

#[derive(Debug, Clone)]
pub struct DiffArgs {
    pub config: PathBuf,
    pub pre: String,
    pub post: String,
}

/// Shows the raw structural difference between two stored snapshots, without
/// consulting any test file.
pub fn run(args: &DiffArgs) -> CommandOutput {
    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(message) => return CommandOutput::usage_error(message),
    };
    let store = DirStore::new(&config.snapshot_dir);

    let mut diffs: Vec<SnapshotDiff> = Vec::new();
    let mut failures: Vec<(String, String)> = Vec::new();
    for host in &config.hosts {
        let pre = store.get(&host.name, &args.pre);
        let post = store.get(&host.name, &args.post);
        match (pre, post) {
            (Ok(pre), Ok(post)) => diffs.push(diff::diff_snapshots(&pre, &post)),
            (Err(error), _) | (_, Err(error)) => {
                failures.push((host.name.clone(), error.to_string()));
            }
        }
    }

    let mut text = render::render_diffs(&diffs);
    for (host, reason) in &failures {
        text.push_str(&format!("snapshot unavailable for {host}: {reason}\n"));
    }

    let payload = match serde_json::to_value(&diffs) {
        Ok(serialized) => json!({
            "diffs": serialized,
            "failures": failures
                .iter()
                .map(|(host, reason)| json!({"host": host, "reason": reason}))
                .collect::<Vec<_>>(),
        }),
        Err(error) => {
            return CommandOutput::internal_error(format!("failed to serialize diff: {error}"));
        }
    };

    let exit_code = if failures.is_empty() { 0 } else { 2 };
    CommandOutput {
        exit_code,
        text,
        payload,
    }
}
