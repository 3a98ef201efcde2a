use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level run configuration (`main.yml`): hosts to work, test files to
/// evaluate, and where snapshots live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MainConfig {
    pub hosts: Vec<HostConfig>,
    pub tests: Vec<PathBuf>,
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
    #[serde(default)]
    pub mail: Option<MailConfig>,
    #[serde(default)]
    pub workers: Option<usize>,
}

/// One device to capture from. `source` is the transcript directory holding
/// one file per command; device transport itself stays behind the capture
/// seam.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    pub name: String,
    pub source: PathBuf,
}

/// Outbound report delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MailConfig {
    pub to: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
}

fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("snapshots")
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to open config file `{path}`: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file `{path}`: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config file `{path}` lists no hosts")]
    NoHosts { path: String },

    #[error("config file `{path}` lists no test files")]
    NoTests { path: String },
}

pub fn load(path: &Path) -> Result<MainConfig, ConfigError> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|source| ConfigError::Open {
        path: display.clone(),
        source,
    })?;
    let config: MainConfig = serde_yaml::from_reader(file).map_err(|source| ConfigError::Parse {
        path: display.clone(),
        source,
    })?;
    if config.hosts.is_empty() {
        return Err(ConfigError::NoHosts { path: display });
    }
    if config.tests.is_empty() {
        return Err(ConfigError::NoTests { path: display });
    }
    Ok(config)
}
