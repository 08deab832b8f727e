//! InfraKit: GitOps onboarding for Helm-packaged applications.
//!
//! # Usage
//!
//! ```text
//! infrakit onboard --name <app> --cluster <cluster> --chart <chart> --repo <git-url>
//!                  [--namespace <ns>] [--path <dir>] [--revision <rev>]
//!                  [--values <json> | --values-file <file>] [--kubeconfig <path>]
//! infrakit sync <app>
//! infrakit status <app> [--json] [--live]
//! ```
//!
//! Configuration is read from `$INFRAKIT_CONFIG`, or `~/.infrakit/config.yaml`.

mod commands;
mod context;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{onboard::OnboardArgs, status::StatusArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "infrakit",
    version,
    about = "Onboard applications into GitOps delivery and track their state",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render, validate, record and register an application.
    Onboard(OnboardArgs),

    /// Trigger reconciliation of an onboarded application.
    Sync(SyncArgs),

    /// Show the best-known state of an application.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    context::init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Onboard(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}
