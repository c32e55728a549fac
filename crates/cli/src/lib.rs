pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "opsgen",
    about = "Opsgen operator CLI",
    long_about = "Generate grammar-constrained admin scripts, execute reviewed scripts locally, and inspect runtime readiness.",
    after_help = "Examples:\n  opsgen generate --env gam --task \"onboard user neil\"\n  opsgen execute --file scripts/onboard.sh\n  opsgen doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Generate a constrained shell script for an admin task")]
    Generate {
        #[arg(long, help = "Target environment (gam|m365)")]
        env: String,
        #[arg(long, help = "Natural-language task description")]
        task: String,
        #[arg(long, help = "Use the frozen fixture response instead of a live call")]
        fixture: bool,
    },
    #[command(about = "Execute a reviewed script after typing the confirmation phrase")]
    Execute {
        #[arg(long, help = "Path to the script file to run")]
        file: String,
    },
    #[command(about = "Inspect effective configuration values with secret redaction")]
    Config,
    #[command(about = "Validate config, grammar presence, and generation readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Generate { env, task, fixture } => commands::generate::run(&env, &task, fixture),
        Command::Execute { file } => commands::execute::run(&file),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
