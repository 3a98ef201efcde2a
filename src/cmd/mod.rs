pub mod check;
pub mod diff;
pub mod init;
pub mod snap;

use std::path::Path;

use serde_json::{Value, json};

use crate::domain::config::{self, MainConfig};
use crate::domain::testspec::{self, TestSuite};
use crate::engine::runner::DEFAULT_WORKERS;
use crate::store::DirStore;

/// Uniform command outcome: exit-code mapping, console text and JSON payload.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub text: String,
    pub payload: Value,
}

impl CommandOutput {
    pub fn usage_error(message: String) -> Self {
        Self {
            exit_code: 3,
            text: message.clone(),
            payload: json!({
                "error": "input_usage_error",
                "message": message,
            }),
        }
    }

    pub fn internal_error(message: String) -> Self {
        Self {
            exit_code: 1,
            text: message.clone(),
            payload: json!({
                "error": "internal_error",
                "message": message,
            }),
        }
    }
}

/// Loaded run context shared by the snapshot-driven commands.
pub(crate) struct Setup {
    pub config: MainConfig,
    pub suite: TestSuite,
    pub store: DirStore,
}

impl Setup {
    pub(crate) fn workers(&self) -> usize {
        self.config.workers.unwrap_or(DEFAULT_WORKERS)
    }
}

pub(crate) fn load_config(path: &Path) -> Result<MainConfig, String> {
    config::load(path).map_err(|error| error.to_string())
}

/// Loads the config plus every test file it lists, in order. Test paths are
/// tried as given, then relative to the config file's directory.
pub(crate) fn load_setup(config_path: &Path) -> Result<Setup, String> {
    let config = load_config(config_path)?;
    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let mut suite = TestSuite::default();
    for test_path in &config.tests {
        let resolved = if test_path.is_file() {
            test_path.clone()
        } else {
            config_dir.join(test_path)
        };
        let loaded = testspec::load(&resolved).map_err(|error| error.to_string())?;
        suite.extend(loaded);
    }

    let store = DirStore::new(&config.snapshot_dir);
    Ok(Setup {
        config,
        suite,
        store,
    })
}
