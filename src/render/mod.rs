use std::fmt::Write as _;

use crate::domain::report::{Overall, RunReport, Verdict};
use crate::engine::diff::SnapshotDiff;

/// Renders the finished report tree as console text: per host, per command,
/// per check — verdict, resolved values and message.
pub fn render_run(report: &RunReport) -> String {
    let mut out = String::new();
    for host in &report.hosts {
        let _ = writeln!(out, "host {}", host.host);
        for command in &host.commands {
            let _ = writeln!(out, "  command `{}`", command.command);
            for result in &command.results {
                let verdict = match result.verdict {
                    Verdict::Pass => "PASS",
                    Verdict::Fail => "FAIL",
                };
                let field = result
                    .field
                    .as_deref()
                    .map(|field| format!(" {field}"))
                    .unwrap_or_default();
                let _ = writeln!(
                    out,
                    "    {verdict} {}{field}: {}",
                    result.operator, result.message
                );
            }
            let _ = writeln!(
                out,
                "    {} passed, {} failed",
                command.passed, command.failed
            );
        }
    }
    if !report.capture_failures.is_empty() {
        let _ = writeln!(out, "capture failures");
        for failure in &report.capture_failures {
            let _ = writeln!(out, "  {}: {}", failure.host, failure.reason);
        }
    }
    let overall = match report.overall {
        Overall::Passed => "PASSED",
        Overall::Failed => "FAILED",
        Overall::NoTests => "NO TESTS EVALUATED",
    };
    let _ = writeln!(
        out,
        "overall: {overall} ({} passed, {} failed)",
        report.passed, report.failed
    );
    out
}

/// Renders raw snapshot diffs as console text.
pub fn render_diffs(diffs: &[SnapshotDiff]) -> String {
    let mut out = String::new();
    for diff in diffs {
        let _ = writeln!(
            out,
            "host {} ({} -> {})",
            diff.host, diff.pre_label, diff.post_label
        );
        if diff.is_empty() {
            let _ = writeln!(out, "  no differences");
            continue;
        }
        for command in &diff.pre_only_commands {
            let _ = writeln!(out, "  command `{command}` only in {}", diff.pre_label);
        }
        for command in &diff.post_only_commands {
            let _ = writeln!(out, "  command `{command}` only in {}", diff.post_label);
        }
        for command in &diff.commands {
            if command.entries.is_empty() {
                continue;
            }
            let _ = writeln!(out, "  command `{}`", command.command);
            for entry in &command.entries {
                let _ = writeln!(out, "    {}: {} -> {}", entry.path, entry.pre, entry.post);
            }
            if command.truncated {
                let _ = writeln!(
                    out,
                    "    ... {} differences total, list truncated",
                    command.total
                );
            }
        }
    }
    out
}

/// Mail body: the console rendering with a one-line summary header.
pub fn render_mail_body(report: &RunReport) -> String {
    let header = match report.overall {
        Overall::Passed => "All checks passed.",
        Overall::Failed => "Some checks failed.",
        Overall::NoTests => "No tests were evaluated.",
    };
    format!("{header}\n\n{}", render_run(report))
}
