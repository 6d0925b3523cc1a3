//! Freeport CLI - Free network ports held by local processes
//!
//! A command-line tool for finding the processes bound to a port and
//! terminating them, gracefully first.

mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use freeport_core::{OperationStatus, Protocol};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "freeport")]
#[command(author, version, about = "Free network ports held by local processes")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the processes bound to a port
    #[command(alias = "ls")]
    List {
        /// Port number to inspect
        port: u32,

        /// Only consider one protocol (tcp or udp)
        #[arg(short, long)]
        protocol: Option<Protocol>,

        /// Also show processes that would be left untouched
        #[arg(short, long)]
        all: bool,
    },

    /// Terminate the processes bound to a port
    Kill {
        /// Port number to free
        port: u32,

        /// Only consider one protocol (tcp or udp)
        #[arg(short, long)]
        protocol: Option<Protocol>,

        /// Milliseconds to wait after the graceful signal
        #[arg(long)]
        grace_ms: Option<u64>,

        /// Milliseconds to wait after the forceful signal
        #[arg(long)]
        force_timeout_ms: Option<u64>,

        /// Never terminate owners matching this regex (repeatable)
        #[arg(short = 'x', long = "exclude")]
        exclude: Vec<String>,

        /// Do not protect browsers
        #[arg(long)]
        no_default_exclusions: bool,

        /// Show what would be terminated without sending any signal
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Terminate processes by PID
    Terminate {
        /// Process IDs to terminate
        #[arg(required = true)]
        pids: Vec<u32>,
    },

    /// Show current configuration
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::List {
            port,
            protocol,
            all,
        } => commands::list::run(port, protocol, all, cli.json).await,
        Commands::Kill {
            port,
            protocol,
            grace_ms,
            force_timeout_ms,
            exclude,
            no_default_exclusions,
            dry_run,
        } => {
            let options = commands::kill::KillOptions {
                protocol,
                grace_ms,
                force_timeout_ms,
                exclude,
                no_default_exclusions,
                dry_run,
            };
            commands::kill::run(port, options, cli.json).await
        }
        Commands::Terminate { pids } => commands::terminate::run(pids, cli.json).await,
        Commands::Config => commands::config::show(cli.json).await,
    };

    match result {
        Ok(code) => Ok(code),
        Err(e) => match e.downcast_ref::<freeport_core::Error>() {
            Some(core) if core.is_resolution_failure() || matches!(core, freeport_core::Error::InvalidPort(_)) => {
                eprintln!("Error: {}", core);
                Ok(exit_code(OperationStatus::ResolutionFailure))
            }
            _ => Err(e),
        },
    }
}

/// Logs go to stderr so `--json` output stays machine readable.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "freeport=debug,freeport_core=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub(crate) fn exit_code(status: OperationStatus) -> ExitCode {
    ExitCode::from(status.exit_code() as u8)
}
