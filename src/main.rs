use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{Value, json};
use snapq::cmd::{CommandOutput, check, diff, init, snap};

#[derive(Debug, Parser)]
#[command(
    name = "snapq",
    version,
    about = "Capture device snapshots and evaluate declarative checks against them"
)]
struct Cli {
    /// Emit the JSON report instead of console text.
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Capture a named snapshot for every configured host.
    Snap(SnapArgs),
    /// Compare two stored snapshots with the configured test files.
    Check(CheckArgs),
    /// Capture a snapshot and evaluate it immediately.
    Snapcheck(SnapcheckArgs),
    /// Show the raw structural difference between two stored snapshots.
    Diff(DiffArgs),
    /// Scaffold the working directory (snapshots/, configs/, main.yml).
    Init(InitArgs),
}

#[derive(Debug, clap::Args)]
struct SnapArgs {
    /// Snapshot label to store under.
    label: String,

    #[arg(short = 'f', long = "file", default_value = "main.yml")]
    config: PathBuf,
}

#[derive(Debug, clap::Args)]
struct CheckArgs {
    /// Label of the pre snapshot.
    pre: String,

    /// Label of the post snapshot.
    post: String,

    #[arg(short = 'f', long = "file", default_value = "main.yml")]
    config: PathBuf,

    /// Mail the report to this address.
    #[arg(short = 'm', long)]
    mail: Option<String>,
}

#[derive(Debug, clap::Args)]
struct SnapcheckArgs {
    /// Snapshot label to store under before evaluating.
    label: String,

    #[arg(short = 'f', long = "file", default_value = "main.yml")]
    config: PathBuf,

    /// Mail the report to this address.
    #[arg(short = 'm', long)]
    mail: Option<String>,
}

#[derive(Debug, clap::Args)]
struct DiffArgs {
    /// Label of the pre snapshot.
    pre: String,

    /// Label of the post snapshot.
    post: String,

    #[arg(short = 'f', long = "file", default_value = "main.yml")]
    config: PathBuf,
}

#[derive(Debug, clap::Args)]
struct InitArgs {
    /// Replace files created by a previous init.
    #[arg(short = 'o', long, default_value_t = false)]
    overwrite: bool,
}

#[derive(Serialize)]
struct CliError<'a> {
    error: &'a str,
    message: String,
    code: i32,
    details: Value,
}

fn main() {
    process::exit(run());
}

fn run() -> i32 {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => return handle_parse_error(error),
    };

    let output = match cli.command {
        Commands::Snap(args) => snap::run(&snap::SnapArgs {
            config: args.config,
            label: args.label,
        }),
        Commands::Check(args) => check::run_check(&check::CheckArgs {
            config: args.config,
            pre: args.pre,
            post: args.post,
            mail: args.mail,
        }),
        Commands::Snapcheck(args) => check::run_snapcheck(&check::SnapcheckArgs {
            config: args.config,
            label: args.label,
            mail: args.mail,
        }),
        Commands::Diff(args) => diff::run(&diff::DiffArgs {
            config: args.config,
            pre: args.pre,
            post: args.post,
        }),
        Commands::Init(args) => init::run(&init::InitArgs {
            root: PathBuf::from("."),
            overwrite: args.overwrite,
        }),
    };

    emit_output(&output, cli.json)
}

fn emit_output(output: &CommandOutput, json_mode: bool) -> i32 {
    match output.exit_code {
        0 | 2 => {
            if json_mode {
                match serde_json::to_string(&output.payload) {
                    Ok(serialized) => println!("{serialized}"),
                    Err(error) => {
                        emit_error(
                            "internal_error",
                            format!("failed to serialize report: {error}"),
                            json!({}),
                            1,
                        );
                        return 1;
                    }
                }
            } else {
                print!("{}", output.text);
            }
            output.exit_code
        }
        code => {
            emit_error(
                if code == 3 {
                    "input_usage_error"
                } else {
                    "internal_error"
                },
                output.text.trim_end().to_string(),
                output.payload.clone(),
                code,
            );
            code
        }
    }
}

fn handle_parse_error(error: clap::Error) -> i32 {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{error}");
            0
        }
        _ => {
            emit_error(
                "input_usage_error",
                error.to_string(),
                json!({"kind": "cli_parse_error"}),
                3,
            );
            3
        }
    }
}

fn emit_error(error: &'static str, message: String, details: Value, code: i32) {
    let payload = CliError {
        error,
        message,
        code,
        details,
    };
    match serde_json::to_string(&payload) {
        Ok(serialized) => eprintln!("{serialized}"),
        Err(_) => eprintln!(
            "{{\"error\":\"internal_error\",\"message\":\"failed to serialize error\",\"code\":1}}"
        ),
    }
}
