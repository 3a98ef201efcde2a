use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::snapshot::Snapshot;

/// Maximum value differences reported per command.
pub const DEFAULT_DIFF_CAP: usize = 200;

/// Raw structural difference between two snapshots, without any test file.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SnapshotDiff {
    pub host: String,
    pub pre_label: String,
    pub post_label: String,
    pub pre_only_commands: Vec<String>,
    pub post_only_commands: Vec<String>,
    pub commands: Vec<CommandDiff>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.pre_only_commands.is_empty()
            && self.post_only_commands.is_empty()
            && self.commands.iter().all(|command| command.entries.is_empty())
    }
}

/// Value differences for one shared command, at stable dotted paths.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommandDiff {
    pub command: String,
    pub total: usize,
    pub truncated: bool,
    pub entries: Vec<DiffEntry>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DiffEntry {
    pub path: String,
    pub pre: Value,
    pub post: Value,
}

/// Compares two snapshots command by command. Deterministic: commands in
/// sorted order, object keys in sorted order, list elements by position.
pub fn diff_snapshots(pre: &Snapshot, post: &Snapshot) -> SnapshotDiff {
    let pre_commands: BTreeSet<&String> = pre.commands.keys().collect();
    let post_commands: BTreeSet<&String> = post.commands.keys().collect();

    let mut commands = Vec::new();
    for command in pre_commands.intersection(&post_commands) {
        let mut collector = DiffCollector::new(DEFAULT_DIFF_CAP);
        if let (Some(pre_doc), Some(post_doc)) =
            (pre.document(command), post.document(command))
        {
            compare_values(pre_doc, post_doc, &mut String::new(), &mut collector);
        }
        commands.push(CommandDiff {
            command: (*command).clone(),
            total: collector.total,
            truncated: collector.truncated,
            entries: collector.entries,
        });
    }

    SnapshotDiff {
        host: pre.host.clone(),
        pre_label: pre.label.clone(),
        post_label: post.label.clone(),
        pre_only_commands: pre_commands
            .difference(&post_commands)
            .map(|command| (*command).clone())
            .collect(),
        post_only_commands: post_commands
            .difference(&pre_commands)
            .map(|command| (*command).clone())
            .collect(),
        commands,
    }
}

fn compare_values(pre: &Value, post: &Value, path: &mut String, collector: &mut DiffCollector) {
    if pre == post {
        return;
    }
    match (pre, post) {
        (Value::Object(pre_map), Value::Object(post_map)) => {
            compare_objects(pre_map, post_map, path, collector);
        }
        (Value::Array(pre_items), Value::Array(post_items)) => {
            compare_arrays(pre_items, post_items, path, collector);
        }
        _ => collector.push(path, pre.clone(), post.clone()),
    }
}

fn compare_objects(
    pre_map: &Map<String, Value>,
    post_map: &Map<String, Value>,
    path: &mut String,
    collector: &mut DiffCollector,
) {
    let mut keys: BTreeSet<&str> = BTreeSet::new();
    keys.extend(pre_map.keys().map(String::as_str));
    keys.extend(post_map.keys().map(String::as_str));

    for key in keys {
        let saved = path.len();
        push_segment(path, key);
        match (pre_map.get(key), post_map.get(key)) {
            (Some(pre_value), Some(post_value)) => {
                compare_values(pre_value, post_value, path, collector);
            }
            (Some(pre_value), None) => collector.push(path, pre_value.clone(), Value::Null),
            (None, Some(post_value)) => collector.push(path, Value::Null, post_value.clone()),
            (None, None) => {}
        }
        path.truncate(saved);
    }
}

fn compare_arrays(
    pre_items: &[Value],
    post_items: &[Value],
    path: &mut String,
    collector: &mut DiffCollector,
) {
    let shared = pre_items.len().min(post_items.len());
    for index in 0..shared {
        let saved = path.len();
        push_segment(path, &index.to_string());
        compare_values(&pre_items[index], &post_items[index], path, collector);
        path.truncate(saved);
    }
    for (index, item) in pre_items.iter().enumerate().skip(shared) {
        let saved = path.len();
        push_segment(path, &index.to_string());
        collector.push(path, item.clone(), Value::Null);
        path.truncate(saved);
    }
    for (index, item) in post_items.iter().enumerate().skip(shared) {
        let saved = path.len();
        push_segment(path, &index.to_string());
        collector.push(path, Value::Null, item.clone());
        path.truncate(saved);
    }
}

fn push_segment(path: &mut String, segment: &str) {
    if !path.is_empty() {
        path.push('.');
    }
    path.push_str(segment);
}

struct DiffCollector {
    cap: usize,
    total: usize,
    truncated: bool,
    entries: Vec<DiffEntry>,
}

impl DiffCollector {
    fn new(cap: usize) -> Self {
        Self {
            cap,
            total: 0,
            truncated: false,
            entries: Vec::new(),
        }
    }

    fn push(&mut self, path: &str, pre: Value, post: Value) {
        self.total += 1;
        if self.entries.len() < self.cap {
            self.entries.push(DiffEntry {
                path: path.to_string(),
                pre,
                post,
            });
        } else {
            self.truncated = true;
        }
    }
}
