use std::path::{Path, PathBuf};

use serde_json::json;

use crate::cmd::CommandOutput;

#[derive(Debug, Clone)]
pub struct InitArgs {
    pub root: PathBuf,
    pub overwrite: bool,
}

const SAMPLE_MAIN: &str = "\
# snapq run configuration
hosts:
  - name: router1
    source: transcripts/router1
tests:
  - configs/tests.yml
snapshot_dir: snapshots
# mail:
#   to: ops@example.net
#   subject: snapshot check
# workers: 4
";

const SAMPLE_TESTS: &str = "\
tests:
  - command: show interfaces
    iterate: interfaces.*
    key: name
    checks:
      - operator: no-diff
        field: status
        message: \"status changed on {id}: {pre} -> {post}\"
  - command: show system
    checks:
      - operator: is-lt
        field: cpu.load
        value: 80
";

/// Scaffolds the working directory: `snapshots/`, `configs/` with a sample
/// test file, and a starter `main.yml`. Existing files are left alone unless
/// `--overwrite` is passed.
pub fn run(args: &InitArgs) -> CommandOutput {
    let mut created = Vec::new();
    let mut skipped = Vec::new();

    let snapshots = args.root.join("snapshots");
    if let Err(error) = std::fs::create_dir_all(&snapshots) {
        return CommandOutput::internal_error(format!(
            "failed to create `{}`: {error}",
            snapshots.display()
        ));
    }
    created.push(snapshots.display().to_string());

    let configs = args.root.join("configs");
    if let Err(error) = std::fs::create_dir_all(&configs) {
        return CommandOutput::internal_error(format!(
            "failed to create `{}`: {error}",
            configs.display()
        ));
    }

    for (path, contents) in [
        (configs.join("tests.yml"), SAMPLE_TESTS),
        (args.root.join("main.yml"), SAMPLE_MAIN),
    ] {
        match write_sample(&path, contents, args.overwrite) {
            Ok(true) => created.push(path.display().to_string()),
            Ok(false) => skipped.push(path.display().to_string()),
            Err(error) => {
                return CommandOutput::internal_error(format!(
                    "failed to write `{}`: {error}",
                    path.display()
                ));
            }
        }
    }

    let mut text = String::new();
    for path in &created {
        text.push_str(&format!("created {path}\n"));
    }
    for path in &skipped {
        text.push_str(&format!("kept existing {path} (use --overwrite to replace)\n"));
    }

    CommandOutput {
        exit_code: 0,
        text,
        payload: json!({"created": created, "skipped": skipped}),
    }
}

fn write_sample(path: &Path, contents: &str, overwrite: bool) -> Result<bool, std::io::Error> {
    if path.exists() && !overwrite {
        return Ok(false);
    }
    std::fs::write(path, contents)?;
    Ok(true)
}
