pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "forecourt",
    about = "Forecourt operator CLI",
    long_about = "Inspect configuration, validate runtime readiness, and smoke-test the conversation path.",
    after_help = "Examples:\n  forecourt doctor --json\n  forecourt config\n  forecourt stats\n  forecourt smoke"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, catalog readiness, and delivery token checks")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Print catalog statistics from the configured dataset")]
    Stats,
    #[command(about = "Run a canned conversation through the real capabilities with timings")]
    Smoke,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Stats => commands::CommandResult { exit_code: 0, output: commands::stats::run() },
        Command::Smoke => commands::smoke::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
