use std::fs::File;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::domain::config::HostConfig;
use crate::util::slug::slug;

/// Errors raised while producing one command's output document. The engine
/// never retries; a failure skips the host's evaluation and is reported as a
/// capture failure, not a test failure.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no transcript for command `{command}` under `{dir}`")]
    MissingTranscript { command: String, dir: String },

    #[error("failed to read transcript `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse transcript `{path}`: {source}")]
    ParseJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse transcript `{path}`: {source}")]
    ParseYaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Produces one command's output document for a host. Live device transport
/// implements this same seam; the engine only ever sees documents.
pub trait Capture {
    fn capture(&self, host: &HostConfig, command: &str) -> Result<Value, CaptureError>;
}

/// Reads pre-collected command transcripts from the host's source directory.
/// One file per command, named by the slugged command (`show interfaces` →
/// `show_interfaces.json`), JSON or YAML.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranscriptCapture;

impl Capture for TranscriptCapture {
    fn capture(&self, host: &HostConfig, command: &str) -> Result<Value, CaptureError> {
        let stem = slug(command);
        for extension in ["json", "yaml", "yml"] {
            let path = host.source.join(format!("{stem}.{extension}"));
            if path.is_file() {
                return read_document(&path, extension == "json");
            }
        }
        Err(CaptureError::MissingTranscript {
            command: command.to_string(),
            dir: host.source.display().to_string(),
        })
    }
}

fn read_document(path: &Path, json: bool) -> Result<Value, CaptureError> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|source| CaptureError::Read {
        path: display.clone(),
        source,
    })?;
    if json {
        serde_json::from_reader(file).map_err(|source| CaptureError::ParseJson {
            path: display,
            source,
        })
    } else {
        let yaml: serde_yaml::Value =
            serde_yaml::from_reader(file).map_err(|source| CaptureError::ParseYaml {
                path: display.clone(),
                source,
            })?;
        serde_json::to_value(yaml).map_err(|source| CaptureError::ParseJson {
            path: display,
            source,
        })
    }
}
