// SPDX-FileCopyrightText: 2026 Echoform Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Echoform - personality echo training and session pipeline.
//!
//! This is the binary entry point for the Echoform service tooling.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod doctor;
mod status;
mod sweep;

/// Echoform - personality echo training and session pipeline.
#[derive(Parser, Debug)]
#[command(name = "echoform", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run diagnostic checks against the Echoform environment.
    Doctor {
        /// Run additional intensive checks.
        #[arg(long)]
        deep: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Show profile and session state from the local database.
    Status {
        /// Output structured JSON for scripting.
        #[arg(long)]
        json: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Run the retention and liveness sweeps once, outside the schedule.
    Sweep,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match echoform_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            echoform_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.agent.log_level.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Some(Commands::Doctor { deep, plain }) => doctor::run_doctor(&config, deep, plain).await,
        Some(Commands::Status { json, plain }) => status::run_status(&config, json, plain).await,
        Some(Commands::Sweep) => sweep::run_sweep(&config).await,
        None => {
            println!("echoform: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("echoform: {e}");
        std::process::exit(1);
    }
}
