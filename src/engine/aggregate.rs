use crate::domain::report::{
    CaptureFailure, CommandReport, HostReport, Overall, RunReport, TestResult, Verdict,
};

/// Rolls one host's flat result stream into the per-command report tree.
/// Pure: consumes the stream, performs no I/O, and is total over any input.
pub fn aggregate_host(host: &str, results: Vec<TestResult>) -> HostReport {
    let mut commands: Vec<CommandReport> = Vec::new();
    for result in results {
        let index = match commands
            .iter()
            .position(|command| command.command == result.command)
        {
            Some(index) => index,
            None => {
                commands.push(CommandReport {
                    command: result.command.clone(),
                    passed: 0,
                    failed: 0,
                    results: Vec::new(),
                });
                commands.len() - 1
            }
        };
        let command = &mut commands[index];
        match result.verdict {
            Verdict::Pass => command.passed += 1,
            Verdict::Fail => command.failed += 1,
        }
        command.results.push(result);
    }

    let passed = commands.iter().map(|command| command.passed).sum();
    let failed = commands.iter().map(|command| command.failed).sum();
    HostReport {
        host: host.to_string(),
        passed,
        failed,
        commands,
    }
}

/// Combines host reports and capture failures into the run verdict. Overall
/// PASS requires at least one evaluated result and zero failures of any kind.
pub fn aggregate_run(hosts: Vec<HostReport>, capture_failures: Vec<CaptureFailure>) -> RunReport {
    let passed: usize = hosts.iter().map(|host| host.passed).sum();
    let failed: usize = hosts.iter().map(|host| host.failed).sum();
    let overall = if failed > 0 || !capture_failures.is_empty() {
        Overall::Failed
    } else if passed == 0 {
        Overall::NoTests
    } else {
        Overall::Passed
    };
    RunReport {
        overall,
        passed,
        failed,
        hosts,
        capture_failures,
    }
}
