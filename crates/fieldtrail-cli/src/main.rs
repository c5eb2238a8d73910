//! FieldTrail CLI
//!
//! Command-line interface for validating tracking configs and replaying
//! mutation scripts through the change tracker

use clap::{Parser, Subcommand, ValueEnum};
use fieldtrail_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "fieldtrail")]
#[command(about = "FieldTrail - field-level change tracking", long_about = None)]
struct Cli {
    /// Log output format (logs go to stderr)
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Dev)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Dev,
    Prod,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Validate a tracking config against the built-in serializers
    Check(commands::check::CheckArgs),
    /// Replay a JSON mutation script and print the emitted events
    Replay(commands::replay::ReplayArgs),
}

fn main() {
    let cli = Cli::parse();

    init(match cli.log_format {
        LogFormat::Dev => Profile::Development,
        LogFormat::Prod => Profile::Production,
    });

    let result = match cli.command {
        Commands::Check(args) => commands::check::execute(args),
        Commands::Replay(args) => commands::replay::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
