use std::fmt;
use std::fs::File;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::domain::path::FieldPath;

/// Closed set of comparison operators, validated at load time so an operator
/// typo can never reach evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    IsEqual,
    NotEqual,
    IsGt,
    IsGte,
    IsLt,
    IsLte,
    InRange,
    Exists,
    NotExists,
    ListNotEmpty,
    IsIn,
    NotIn,
    NoDiff,
}

impl Operator {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "is-equal" => Some(Self::IsEqual),
            "not-equal" => Some(Self::NotEqual),
            "is-gt" => Some(Self::IsGt),
            "is-gte" => Some(Self::IsGte),
            "is-lt" => Some(Self::IsLt),
            "is-lte" => Some(Self::IsLte),
            "in-range" => Some(Self::InRange),
            "exists" => Some(Self::Exists),
            "not-exists" => Some(Self::NotExists),
            "list-not-empty" => Some(Self::ListNotEmpty),
            "is-in" => Some(Self::IsIn),
            "not-in" => Some(Self::NotIn),
            "no-diff" => Some(Self::NoDiff),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::IsEqual => "is-equal",
            Self::NotEqual => "not-equal",
            Self::IsGt => "is-gt",
            Self::IsGte => "is-gte",
            Self::IsLt => "is-lt",
            Self::IsLte => "is-lte",
            Self::InRange => "in-range",
            Self::Exists => "exists",
            Self::NotExists => "not-exists",
            Self::ListNotEmpty => "list-not-empty",
            Self::IsIn => "is-in",
            Self::NotIn => "not-in",
            Self::NoDiff => "no-diff",
        }
    }

    /// Operators that compare the resolved value against a declared `value`.
    pub fn expects_value(self) -> bool {
        matches!(
            self,
            Self::IsEqual
                | Self::NotEqual
                | Self::IsGt
                | Self::IsGte
                | Self::IsLt
                | Self::IsLte
                | Self::InRange
                | Self::IsIn
                | Self::NotIn
        )
    }

    /// Operators that need both a pre and a post snapshot.
    pub fn needs_both_snapshots(self) -> bool {
        matches!(self, Self::NoDiff)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// One declarative check: operator, field selector relative to the iterated
/// element (or the whole document), optional expected value and message
/// template.
#[derive(Debug, Clone, PartialEq)]
pub struct TestItem {
    pub operator: Operator,
    pub field: Option<FieldPath>,
    pub value: Option<Value>,
    pub message: Option<String>,
}

/// All checks attached to one command.
#[derive(Debug, Clone, PartialEq)]
pub struct TestBlock {
    pub command: String,
    pub iterate: Option<FieldPath>,
    pub key: Option<String>,
    pub allow_added: bool,
    pub allow_removed: bool,
    pub checks: Vec<TestItem>,
}

/// A block that failed load-time validation. It stays in the suite so the
/// engine can report it as a configuration failure without aborting the run.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedBlock {
    pub command: String,
    pub reason: String,
}

/// Suite entries in file order; invalid blocks are isolated, not fatal.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockEntry {
    Valid(TestBlock),
    Rejected(RejectedBlock),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestSuite {
    pub entries: Vec<BlockEntry>,
}

impl TestSuite {
    pub fn extend(&mut self, other: TestSuite) {
        self.entries.extend(other.entries);
    }

    /// Commands referenced by valid blocks, in suite order, deduplicated.
    pub fn commands(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if let BlockEntry::Valid(block) = entry
                && !out.contains(&block.command.as_str())
            {
                out.push(&block.command);
            }
        }
        out
    }
}

/// File-level load failures. Block-level problems never surface here; they
/// become `BlockEntry::Rejected`.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open test file `{path}`: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse test file `{path}`: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSuite {
    tests: Vec<RawBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawBlock {
    command: String,
    #[serde(default)]
    iterate: Option<String>,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    allow_added: bool,
    #[serde(default)]
    allow_removed: bool,
    #[serde(default)]
    checks: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawItem {
    operator: String,
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

pub fn load(path: &Path) -> Result<TestSuite, LoadError> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: display.clone(),
        source,
    })?;
    let raw: RawSuite = serde_yaml::from_reader(file).map_err(|source| LoadError::Parse {
        path: display,
        source,
    })?;
    Ok(build_suite(raw))
}

fn build_suite(raw: RawSuite) -> TestSuite {
    let mut suite = TestSuite::default();
    for block in raw.tests {
        let entry = match build_block(&block) {
            Ok(built) => BlockEntry::Valid(built),
            Err(reason) => BlockEntry::Rejected(RejectedBlock {
                command: block.command.clone(),
                reason,
            }),
        };
        suite.entries.push(entry);
    }
    suite
}

fn build_block(raw: &RawBlock) -> Result<TestBlock, String> {
    let iterate = raw
        .iterate
        .as_deref()
        .map(FieldPath::parse)
        .transpose()
        .map_err(|error| error.to_string())?;
    if raw.key.is_some() && iterate.is_none() {
        return Err("`key` requires `iterate`".to_string());
    }
    if raw.checks.is_empty() {
        return Err("block declares no checks".to_string());
    }
    let mut checks = Vec::with_capacity(raw.checks.len());
    for item in &raw.checks {
        checks.push(build_item(item)?);
    }
    Ok(TestBlock {
        command: raw.command.clone(),
        iterate,
        key: raw.key.clone(),
        allow_added: raw.allow_added,
        allow_removed: raw.allow_removed,
        checks,
    })
}

fn build_item(raw: &RawItem) -> Result<TestItem, String> {
    let Some(operator) = Operator::parse(&raw.operator) else {
        return Err(format!("unknown operator `{}`", raw.operator));
    };
    let field = raw
        .field
        .as_deref()
        .map(FieldPath::parse)
        .transpose()
        .map_err(|error| error.to_string())?;

    if operator.expects_value() && raw.value.is_none() {
        return Err(format!("operator `{operator}` requires `value`"));
    }
    if !operator.expects_value() && raw.value.is_some() {
        return Err(format!("operator `{operator}` does not take `value`"));
    }
    match operator {
        Operator::InRange => {
            let bounds = raw.value.as_ref().and_then(Value::as_array);
            if bounds.map(Vec::len) != Some(2) {
                return Err("`in-range` requires `value: [min, max]`".to_string());
            }
        }
        Operator::IsIn | Operator::NotIn => {
            if raw.value.as_ref().and_then(Value::as_array).is_none() {
                return Err(format!("operator `{operator}` requires a list `value`"));
            }
        }
        _ => {}
    }

    Ok(TestItem {
        operator,
        field,
        value: raw.value.clone(),
        message: raw.message.clone(),
    })
}
