use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named, host-scoped capture of one or more commands' structured output.
/// Immutable once stored; read back for comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub host: String,
    pub label: String,
    pub taken_at: DateTime<Utc>,
    pub commands: BTreeMap<String, Value>,
}

impl Snapshot {
    pub fn new(host: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            label: label.into(),
            taken_at: Utc::now(),
            commands: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, command: impl Into<String>, document: Value) {
        self.commands.insert(command.into(), document);
    }

    pub fn document(&self, command: &str) -> Option<&Value> {
        self.commands.get(command)
    }
}
