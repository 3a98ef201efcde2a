use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::domain::path::{self, FieldPath, Resolved};
use crate::domain::report::{ResultKind, TestResult, Verdict};
use crate::domain::snapshot::Snapshot;
use crate::domain::testspec::{BlockEntry, Operator, TestBlock, TestItem, TestSuite};
use crate::engine::operator::{self, OpOutcome};

/// Snapshots under evaluation: pre only (snapcheck) or pre and post (check).
#[derive(Debug, Clone, Copy)]
pub struct SnapshotPair<'a> {
    pub pre: &'a Snapshot,
    pub post: Option<&'a Snapshot>,
}

impl<'a> SnapshotPair<'a> {
    pub fn single(snapshot: &'a Snapshot) -> Self {
        Self {
            pre: snapshot,
            post: None,
        }
    }

    pub fn pre_post(pre: &'a Snapshot, post: &'a Snapshot) -> Self {
        Self {
            pre,
            post: Some(post),
        }
    }

    /// The snapshot value operators read from. With a single snapshot the pre
    /// side serves both roles.
    fn post_side(&self) -> &'a Snapshot {
        self.post.unwrap_or(self.pre)
    }
}

/// One correlated element under evaluation, or the whole document when the
/// block declares no iteration.
struct ElementScope<'a> {
    id: Option<String>,
    pre: &'a Value,
    post: &'a Value,
}

/// Evaluates every suite entry in order against the supplied snapshot(s) and
/// returns the flat, deterministic result stream. Rejected blocks surface as
/// configuration failures at their file position; nothing here ever aborts
/// the run.
pub fn evaluate(suite: &TestSuite, snapshots: SnapshotPair<'_>) -> Vec<TestResult> {
    let mut results = Vec::new();
    for entry in &suite.entries {
        match entry {
            BlockEntry::Valid(block) => evaluate_block(block, snapshots, &mut results),
            BlockEntry::Rejected(rejected) => {
                results.push(configuration_failure(&rejected.command, rejected.reason.clone()));
            }
        }
    }
    results
}

fn evaluate_block(block: &TestBlock, snapshots: SnapshotPair<'_>, results: &mut Vec<TestResult>) {
    let post_snapshot = snapshots.post_side();
    let Some(post_doc) = post_snapshot.document(&block.command) else {
        results.push(configuration_failure(
            &block.command,
            format!(
                "no captured output for command `{}` in snapshot `{}`",
                block.command, post_snapshot.label
            ),
        ));
        return;
    };
    let Some(pre_doc) = snapshots.pre.document(&block.command) else {
        results.push(configuration_failure(
            &block.command,
            format!(
                "no captured output for command `{}` in snapshot `{}`",
                block.command, snapshots.pre.label
            ),
        ));
        return;
    };

    let two_snapshots = snapshots.post.is_some();
    match &block.iterate {
        Some(iterate) => {
            let pre_elements = path::resolve(pre_doc, iterate);
            let post_elements = path::resolve(post_doc, iterate);
            match &block.key {
                Some(key) => correlate_by_key(
                    block,
                    &pre_elements,
                    &post_elements,
                    key,
                    two_snapshots,
                    results,
                ),
                None => correlate_by_position(
                    block,
                    &pre_elements,
                    &post_elements,
                    two_snapshots,
                    results,
                ),
            }
        }
        None => {
            let scope = ElementScope {
                id: None,
                pre: pre_doc,
                post: post_doc,
            };
            evaluate_scope(block, &scope, two_snapshots, results);
        }
    }
}

/// Matches elements across snapshots by equal correlation-key value.
/// Unmatched pre elements are removals, unmatched post elements additions;
/// evaluation order is correlation-key sort order.
fn correlate_by_key(
    block: &TestBlock,
    pre_elements: &[Resolved<'_>],
    post_elements: &[Resolved<'_>],
    key: &str,
    two_snapshots: bool,
    results: &mut Vec<TestResult>,
) {
    let pre_keyed = index_by_key(pre_elements, key);
    let post_keyed = index_by_key(post_elements, key);

    let mut ids: BTreeSet<&String> = BTreeSet::new();
    ids.extend(pre_keyed.keys());
    ids.extend(post_keyed.keys());

    for id in ids {
        match (pre_keyed.get(id), post_keyed.get(id)) {
            (Some(pre), Some(post)) => {
                let scope = ElementScope {
                    id: Some(id.clone()),
                    pre,
                    post,
                };
                evaluate_scope(block, &scope, two_snapshots, results);
            }
            (Some(pre), None) => {
                if !block.allow_removed {
                    results.push(correlation_failure(block, id, true, pre));
                }
            }
            (None, Some(post)) => {
                if !block.allow_added {
                    results.push(correlation_failure(block, id, false, post));
                }
            }
            (None, None) => {}
        }
    }
}

/// Elements without a key pair by position; excess elements on either side
/// are failures unless tolerated.
fn correlate_by_position(
    block: &TestBlock,
    pre_elements: &[Resolved<'_>],
    post_elements: &[Resolved<'_>],
    two_snapshots: bool,
    results: &mut Vec<TestResult>,
) {
    let shared = pre_elements.len().min(post_elements.len());
    for index in 0..shared {
        let scope = ElementScope {
            id: Some(index.to_string()),
            pre: pre_elements[index].value,
            post: post_elements[index].value,
        };
        evaluate_scope(block, &scope, two_snapshots, results);
    }
    for element in &pre_elements[shared..] {
        if !block.allow_removed {
            results.push(correlation_failure(block, &element.location, true, element.value));
        }
    }
    for element in &post_elements[shared..] {
        if !block.allow_added {
            results.push(correlation_failure(block, &element.location, false, element.value));
        }
    }
}

fn index_by_key<'a>(elements: &[Resolved<'a>], key: &str) -> BTreeMap<String, &'a Value> {
    let mut out = BTreeMap::new();
    for element in elements {
        // An element missing the key field falls back to its location tag; it
        // will then pair only with the same position on the other side.
        let id = element
            .value
            .get(key)
            .map(render_scalar)
            .unwrap_or_else(|| element.location.clone());
        out.entry(id).or_insert(element.value);
    }
    out
}

fn evaluate_scope(
    block: &TestBlock,
    scope: &ElementScope<'_>,
    two_snapshots: bool,
    results: &mut Vec<TestResult>,
) {
    for item in &block.checks {
        evaluate_item(block, item, scope, two_snapshots, results);
    }
}

fn evaluate_item(
    block: &TestBlock,
    item: &TestItem,
    scope: &ElementScope<'_>,
    two_snapshots: bool,
    results: &mut Vec<TestResult>,
) {
    if item.operator.needs_both_snapshots() && !two_snapshots {
        results.push(TestResult {
            command: block.command.clone(),
            operator: item.operator.as_str().to_string(),
            element: scope.id.clone(),
            field: field_label(item),
            verdict: Verdict::Fail,
            kind: ResultKind::Configuration,
            pre: None,
            post: None,
            expected: None,
            message: format!("{} requires pre and post snapshots", item.operator),
        });
        return;
    }
    match item.operator {
        Operator::Exists => {
            let matches = resolve_in(scope.post, &item.field);
            match matches.first() {
                Some(first) => results.push(item_result(
                    block,
                    item,
                    scope,
                    Some(first.location.clone()),
                    None,
                    Some(first.value.clone()),
                    OpOutcome::pass(),
                )),
                None => results.push(item_result(
                    block,
                    item,
                    scope,
                    field_label(item),
                    None,
                    None,
                    OpOutcome::fail("field not present"),
                )),
            }
        }
        Operator::NotExists => {
            let matches = resolve_in(scope.post, &item.field);
            match matches.first() {
                Some(first) => results.push(item_result(
                    block,
                    item,
                    scope,
                    Some(first.location.clone()),
                    None,
                    Some(first.value.clone()),
                    OpOutcome::fail("field present"),
                )),
                None => results.push(item_result(
                    block,
                    item,
                    scope,
                    field_label(item),
                    None,
                    None,
                    OpOutcome::pass(),
                )),
            }
        }
        Operator::ListNotEmpty => {
            let matches = resolve_in(scope.post, &item.field);
            if matches.is_empty() {
                results.push(item_result(
                    block,
                    item,
                    scope,
                    field_label(item),
                    None,
                    None,
                    OpOutcome::fail("field not present"),
                ));
                return;
            }
            for matched in matches {
                let outcome = operator::list_not_empty(matched.value);
                results.push(item_result(
                    block,
                    item,
                    scope,
                    Some(matched.location),
                    None,
                    Some(matched.value.clone()),
                    outcome,
                ));
            }
        }
        Operator::NoDiff => evaluate_no_diff(block, item, scope, results),
        value_op => {
            let Some(expected) = item.value.as_ref() else {
                results.push(configuration_failure(
                    &block.command,
                    format!("operator `{value_op}` requires `value`"),
                ));
                return;
            };
            let matches = resolve_in(scope.post, &item.field);
            if matches.is_empty() {
                results.push(item_result(
                    block,
                    item,
                    scope,
                    field_label(item),
                    None,
                    None,
                    OpOutcome::fail("field not present"),
                ));
                return;
            }
            for matched in matches {
                let outcome = operator::apply_value(value_op, matched.value, expected);
                results.push(item_result(
                    block,
                    item,
                    scope,
                    Some(matched.location),
                    None,
                    Some(matched.value.clone()),
                    outcome,
                ));
            }
        }
    }
}

fn evaluate_no_diff(
    block: &TestBlock,
    item: &TestItem,
    scope: &ElementScope<'_>,
    results: &mut Vec<TestResult>,
) {
    let pre_matches = resolve_in(scope.pre, &item.field);
    let post_matches = resolve_in(scope.post, &item.field);
    let pre_by_location: BTreeMap<&str, &Value> = pre_matches
        .iter()
        .map(|matched| (matched.location.as_str(), matched.value))
        .collect();
    let post_by_location: BTreeMap<&str, &Value> = post_matches
        .iter()
        .map(|matched| (matched.location.as_str(), matched.value))
        .collect();

    let mut locations: BTreeSet<&str> = BTreeSet::new();
    locations.extend(pre_by_location.keys());
    locations.extend(post_by_location.keys());

    if locations.is_empty() {
        results.push(item_result(
            block,
            item,
            scope,
            field_label(item),
            None,
            None,
            OpOutcome::fail("field not present"),
        ));
        return;
    }

    for location in locations {
        match (
            pre_by_location.get(location).copied(),
            post_by_location.get(location).copied(),
        ) {
            (Some(pre), Some(post)) => {
                let outcome = operator::no_diff(pre, post);
                results.push(item_result(
                    block,
                    item,
                    scope,
                    Some(location.to_string()),
                    Some(pre.clone()),
                    Some(post.clone()),
                    outcome,
                ));
            }
            (Some(pre), None) => results.push(item_result(
                block,
                item,
                scope,
                Some(location.to_string()),
                Some(pre.clone()),
                None,
                OpOutcome::fail("field not present in post snapshot"),
            )),
            (None, Some(post)) => results.push(item_result(
                block,
                item,
                scope,
                Some(location.to_string()),
                None,
                Some(post.clone()),
                OpOutcome::fail("field not present in pre snapshot"),
            )),
            (None, None) => {}
        }
    }
}

/// Resolves an item's field selector inside one element. An absent selector
/// targets the element itself.
fn resolve_in<'a>(element: &'a Value, field: &Option<FieldPath>) -> Vec<Resolved<'a>> {
    match field {
        Some(path) => path::resolve(element, path),
        None => vec![Resolved {
            location: String::new(),
            value: element,
        }],
    }
}

fn field_label(item: &TestItem) -> Option<String> {
    item.field.as_ref().map(ToString::to_string)
}

fn item_result(
    block: &TestBlock,
    item: &TestItem,
    scope: &ElementScope<'_>,
    field: Option<String>,
    pre: Option<Value>,
    post: Option<Value>,
    outcome: OpOutcome,
) -> TestResult {
    let field = field.filter(|label| !label.is_empty());
    let message = finish_message(item, scope.id.as_deref(), field.as_deref(), &pre, &post, &outcome);
    TestResult {
        command: block.command.clone(),
        operator: item.operator.as_str().to_string(),
        element: scope.id.clone(),
        field,
        verdict: outcome.verdict,
        kind: ResultKind::Comparison,
        pre,
        post,
        expected: item.value.clone(),
        message,
    }
}

fn finish_message(
    item: &TestItem,
    id: Option<&str>,
    field: Option<&str>,
    pre: &Option<Value>,
    post: &Option<Value>,
    outcome: &OpOutcome,
) -> String {
    if let Some(template) = &item.message {
        return template
            .replace("{id}", id.unwrap_or(""))
            .replace("{field}", field.unwrap_or(""))
            .replace("{pre}", &optional_text(pre))
            .replace("{post}", &optional_text(post))
            .replace("{expected}", &optional_text(&item.value));
    }
    let detail = outcome
        .reason
        .clone()
        .unwrap_or_else(|| format!("{} ok", item.operator));
    match id {
        Some(id) => format!("{id}: {detail}"),
        None => detail,
    }
}

fn optional_text(value: &Option<Value>) -> String {
    value.as_ref().map(render_scalar).unwrap_or_default()
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn correlation_failure(block: &TestBlock, id: &str, removed: bool, element: &Value) -> TestResult {
    let (message, pre, post) = if removed {
        (
            format!("element `{id}` removed in post snapshot"),
            Some(element.clone()),
            None,
        )
    } else {
        (
            format!("element `{id}` added in post snapshot"),
            None,
            Some(element.clone()),
        )
    };
    TestResult {
        command: block.command.clone(),
        operator: "correlation".to_string(),
        element: Some(id.to_string()),
        field: None,
        verdict: Verdict::Fail,
        kind: ResultKind::Correlation,
        pre,
        post,
        expected: None,
        message,
    }
}

fn configuration_failure(command: &str, message: String) -> TestResult {
    TestResult {
        command: command.to_string(),
        operator: "configuration".to_string(),
        element: None,
        field: None,
        verdict: Verdict::Fail,
        kind: ResultKind::Configuration,
        pre: None,
        post: None,
        expected: None,
        message,
    }
}
