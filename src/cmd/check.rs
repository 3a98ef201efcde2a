use std::path::PathBuf;

use serde_json::json;

use crate::adapters::sendmail::{Notifier, SendmailNotifier};
use crate::capture::Capture;
use crate::cmd::{CommandOutput, Setup, load_setup, snap};
use crate::domain::report::{CaptureFailure, HostReport};
use crate::engine::aggregate;
use crate::engine::eval::{self, SnapshotPair};
use crate::engine::runner;
use crate::render;
use crate::store::SnapshotStore;

#[derive(Debug, Clone)]
pub struct CheckArgs {
    pub config: PathBuf,
    pub pre: String,
    pub post: String,
    pub mail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SnapcheckArgs {
    pub config: PathBuf,
    pub label: String,
    pub mail: Option<String>,
}

enum HostOutcome {
    Report(HostReport),
    Skipped(CaptureFailure),
}

/// Evaluates the configured tests against two stored snapshots per host.
pub fn run_check(args: &CheckArgs) -> CommandOutput {
    let setup = match load_setup(&args.config) {
        Ok(setup) => setup,
        Err(message) => return CommandOutput::usage_error(message),
    };
    let notifier = SendmailNotifier::new(mail_from(&setup));
    run_check_with(args, &setup, &notifier)
}

pub(crate) fn run_check_with(
    args: &CheckArgs,
    setup: &Setup,
    notifier: &dyn Notifier,
) -> CommandOutput {
    let outcomes = runner::run_hosts(&setup.config.hosts, setup.workers(), |host| {
        let pre = setup.store.get(&host.name, &args.pre);
        let post = setup.store.get(&host.name, &args.post);
        match (pre, post) {
            (Ok(pre), Ok(post)) => {
                let results = eval::evaluate(&setup.suite, SnapshotPair::pre_post(&pre, &post));
                HostOutcome::Report(aggregate::aggregate_host(&host.name, results))
            }
            (Err(error), _) | (_, Err(error)) => HostOutcome::Skipped(CaptureFailure {
                host: host.name.clone(),
                reason: error.to_string(),
            }),
        }
    });

    let subject = format!("snapq check {} vs {}", args.pre, args.post);
    finish(outcomes, setup, &args.mail, &subject, notifier)
}

/// Captures a fresh snapshot per host, stores it, then evaluates it alone.
/// Evaluation starts only once the snapshot is durably stored.
pub fn run_snapcheck(args: &SnapcheckArgs) -> CommandOutput {
    let setup = match load_setup(&args.config) {
        Ok(setup) => setup,
        Err(message) => return CommandOutput::usage_error(message),
    };
    let notifier = SendmailNotifier::new(mail_from(&setup));
    run_snapcheck_with(args, &setup, &crate::capture::TranscriptCapture, &notifier)
}

pub(crate) fn run_snapcheck_with(
    args: &SnapcheckArgs,
    setup: &Setup,
    capture: &(impl Capture + Sync),
    notifier: &dyn Notifier,
) -> CommandOutput {
    let outcomes = runner::run_hosts(&setup.config.hosts, setup.workers(), |host| {
        let snapshot = snap::capture_snapshot(capture, host, &setup.suite, &args.label)
            .map_err(|error| error.to_string())
            .and_then(|snapshot| {
                setup
                    .store
                    .put(&snapshot)
                    .map_err(|error| error.to_string())
                    .map(|()| snapshot)
            });
        match snapshot {
            Ok(snapshot) => {
                let results = eval::evaluate(&setup.suite, SnapshotPair::single(&snapshot));
                HostOutcome::Report(aggregate::aggregate_host(&host.name, results))
            }
            Err(reason) => HostOutcome::Skipped(CaptureFailure {
                host: host.name.clone(),
                reason,
            }),
        }
    });

    let subject = format!("snapq snapcheck {}", args.label);
    finish(outcomes, setup, &args.mail, &subject, notifier)
}

fn finish(
    outcomes: Vec<HostOutcome>,
    setup: &Setup,
    cli_mail: &Option<String>,
    subject: &str,
    notifier: &dyn Notifier,
) -> CommandOutput {
    let mut hosts = Vec::new();
    let mut capture_failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            HostOutcome::Report(report) => hosts.push(report),
            HostOutcome::Skipped(failure) => capture_failures.push(failure),
        }
    }

    let report = aggregate::aggregate_run(hosts, capture_failures);
    let mut text = render::render_run(&report);
    let mut payload = match serde_json::to_value(&report) {
        Ok(payload) => payload,
        Err(error) => {
            return CommandOutput::internal_error(format!("failed to serialize report: {error}"));
        }
    };

    if let Some((recipient, subject)) = mail_target(setup, cli_mail, subject) {
        let body = render::render_mail_body(&report);
        if let Err(error) = notifier.notify(&recipient, &subject, &body) {
            // Reported, but never flips a verdict.
            let note = format!("mail delivery to {recipient} failed: {error}");
            text.push_str(&note);
            text.push('\n');
            if let Some(object) = payload.as_object_mut() {
                object.insert("mail_error".to_string(), json!(note));
            }
        }
    }

    CommandOutput {
        exit_code: report.overall.exit_code(),
        text,
        payload,
    }
}

fn mail_from(setup: &Setup) -> Option<String> {
    setup
        .config
        .mail
        .as_ref()
        .and_then(|mail| mail.from.clone())
}

/// Mail goes out when `--mail` is passed or the config declares a recipient;
/// the flag overrides the configured address.
fn mail_target(
    setup: &Setup,
    cli_mail: &Option<String>,
    default_subject: &str,
) -> Option<(String, String)> {
    let config_mail = setup.config.mail.as_ref();
    let recipient = cli_mail
        .clone()
        .or_else(|| config_mail.map(|mail| mail.to.clone()))?;
    let subject = config_mail
        .and_then(|mail| mail.subject.clone())
        .unwrap_or_else(|| default_subject.to_string());
    Some((recipient, subject))
}
