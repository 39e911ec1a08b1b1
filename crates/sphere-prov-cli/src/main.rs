//! # sphere-prov CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sphere_prov_cli::resolve::{run_resolve, ResolveArgs};
use sphere_prov_cli::simulate::{run_simulate, SimulateArgs};
use sphere_prov_cli::trust::{run_trust_anchor, TrustAnchorArgs};

/// One-shot DPS provisioning tools.
///
/// Resolves scope identifiers to their regional DPS profile, prints the
/// compiled-in trust anchor, and dry-runs provisioning against a scripted
/// platform.
#[derive(Parser, Debug)]
#[command(name = "sphere-prov", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    /// Without it, `RUST_LOG` applies, defaulting to `info`.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the regional DPS profile a scope identifier selects.
    Resolve(ResolveArgs),

    /// Print the root CA installed for the China deployment.
    TrustAnchor(TrustAnchorArgs),

    /// Provision against the scripted platform and print the call journal.
    Simulate(SimulateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // Logs go to stderr; stdout carries command output.
    if cli.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let mut stdout = std::io::stdout().lock();
    let result = match cli.command {
        Commands::Resolve(args) => run_resolve(&args, &mut stdout),
        Commands::TrustAnchor(args) => run_trust_anchor(&args, &mut stdout),
        Commands::Simulate(args) => run_simulate(&args, &mut stdout),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
