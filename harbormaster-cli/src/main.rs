//! harbormaster: registry project provisioning CLI.
//!
//! # Usage
//!
//! ```text
//! harbormaster provision <project> --project-id <id> [--json] [--strict]
//! harbormaster deprovision <project> [--json] [--strict]
//! harbormaster routes [--json]
//! harbormaster env list <project-id> [--json] [--show-secrets]
//! harbormaster env projects [--json]
//! ```
//!
//! Global: `--log-format text|json` (logs go to stderr; filter with `RUST_LOG`).

mod commands;
mod logging;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    deprovision::DeprovisionArgs, env::EnvCommand, provision::ProvisionArgs, routes::RoutesArgs,
};
use logging::LogFormat;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "harbormaster",
    version,
    about = "Provision per-project container registry namespaces and credentials",
    long_about = None,
)]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the registry project, robot credential and webhook for a project.
    Provision(ProvisionArgs),

    /// Delete a project's repositories and registry project.
    Deprovision(DeprovisionArgs),

    /// Show the resolved registry and webhook routes.
    Routes(RoutesArgs),

    /// Inspect stored credential records.
    Env {
        #[command(subcommand)]
        command: EnvCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format);
    match cli.command {
        Commands::Provision(args) => args.run(),
        Commands::Deprovision(args) => args.run(),
        Commands::Routes(args) => args.run(),
        Commands::Env { command } => commands::env::run(command),
    }
}
