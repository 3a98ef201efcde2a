use std::fs::{self, File};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::snapshot::Snapshot;
use crate::util::slug::slug;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot `{label}` for host `{host}` not found")]
    NotFound { host: String, label: String },

    #[error("failed to read snapshot file `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse snapshot file `{path}`: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write snapshot file `{path}`: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize snapshot for `{path}`: {source}")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "snapshot file `{path}` holds `{found_host}`/`{found_label}`, expected `{host}`/`{label}`"
    )]
    WrongKey {
        path: String,
        host: String,
        label: String,
        found_host: String,
        found_label: String,
    },
}

/// Maps (host, label) to a stored snapshot. Writes to distinct keys must not
/// interfere, so concurrent host workers need no coordination here.
pub trait SnapshotStore {
    fn get(&self, host: &str, label: &str) -> Result<Snapshot, StoreError>;
    fn put(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// One JSON file per (host, label): `<host>/<label>.json` under the snapshot
/// directory, both components slugged. The host is a directory level of its
/// own, so no host/label pair can alias another one's file. Slugging can
/// still collapse two raw names onto one slug, which is why `get` verifies
/// the stored key.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn file_path(&self, host: &str, label: &str) -> PathBuf {
        self.root.join(slug(host)).join(format!("{}.json", slug(label)))
    }
}

impl SnapshotStore for DirStore {
    fn get(&self, host: &str, label: &str) -> Result<Snapshot, StoreError> {
        let path = self.file_path(host, label);
        if !path.is_file() {
            return Err(StoreError::NotFound {
                host: host.to_string(),
                label: label.to_string(),
            });
        }
        let display = path.display().to_string();
        let file = File::open(&path).map_err(|source| StoreError::Read {
            path: display.clone(),
            source,
        })?;
        let snapshot: Snapshot =
            serde_json::from_reader(file).map_err(|source| StoreError::Parse {
                path: display.clone(),
                source,
            })?;
        if snapshot.host != host || snapshot.label != label {
            return Err(StoreError::WrongKey {
                path: display,
                host: host.to_string(),
                label: label.to_string(),
                found_host: snapshot.host,
                found_label: snapshot.label,
            });
        }
        Ok(snapshot)
    }

    fn put(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let path = self.file_path(&snapshot.host, &snapshot.label);
        let display = path.display().to_string();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: display.clone(),
                source,
            })?;
        }
        let serialized =
            serde_json::to_vec_pretty(snapshot).map_err(|source| StoreError::Serialize {
                path: display.clone(),
                source,
            })?;
        write_atomic(&path, &serialized).map_err(|source| StoreError::Write {
            path: display,
            source,
        })
    }
}

// Write through a temp file then rename, so a reader never observes a
// half-written snapshot.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), std::io::Error> {
    let mut tmp = path.to_path_buf();
    tmp.set_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}
