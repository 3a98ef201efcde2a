use serde::Serialize;
use serde_json::Value;

/// PASS/FAIL outcome of one check applied to one matched element.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

/// What produced the result, beyond an ordinary comparison.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    /// Operator applied to resolved values.
    Comparison,
    /// Malformed test block or missing command output.
    Configuration,
    /// Element added or removed between snapshots.
    Correlation,
}

/// One evaluated check. Never mutated after creation.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TestResult {
    pub command: String,
    pub operator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub verdict: Verdict,
    pub kind: ResultKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    pub message: String,
}

/// Ordered results for one command, with counts.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommandReport {
    pub command: String,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<TestResult>,
}

/// Per-host roll-up.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HostReport {
    pub host: String,
    pub passed: usize,
    pub failed: usize,
    pub commands: Vec<CommandReport>,
}

/// A host whose snapshots could not be produced or read. Kept apart from test
/// failures so a connection problem never reads as a failed check.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CaptureFailure {
    pub host: String,
    pub reason: String,
}

/// Overall run verdict. An empty run is reported explicitly, never as a
/// silent pass.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Overall {
    Passed,
    Failed,
    NoTests,
}

impl Overall {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Passed => 0,
            Self::Failed | Self::NoTests => 2,
        }
    }
}

/// Finished report tree for one run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunReport {
    pub overall: Overall,
    pub passed: usize,
    pub failed: usize,
    pub hosts: Vec<HostReport>,
    pub capture_failures: Vec<CaptureFailure>,
}
