// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! wraith: CLI front-end for the pipeline runtime.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod commands;
mod exit_error;
mod prompt;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_error::ExitError;

#[derive(Parser)]
#[command(name = "wraith", version, about = "Modular pipeline runtime for OSINT data processing")]
struct Cli {
    /// Log filter, e.g. `info` or `wr_engine=debug`
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a pipeline
    Run(commands::run::RunArgs),
    /// Validate a pipeline's configuration without executing modules
    Validate(commands::run::ValidateArgs),
    /// List pipelines or modules
    #[command(subcommand)]
    List(commands::list::ListCommand),
    /// Module signing and trusted-signer management
    #[command(subcommand)]
    Security(commands::security::SecurityCommand),
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(command: Command) -> Result<(), ExitError> {
    match command {
        Command::Run(args) => commands::run::run(args).await,
        Command::Validate(args) => commands::run::validate(args).await,
        Command::List(command) => commands::list::run(command),
        Command::Security(command) => {
            commands::security::run(command).map_err(|err| ExitError::new(1, format!("{:#}", err)))
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    if let Err(err) = dispatch(cli.command).await {
        if !err.message.is_empty() {
            eprintln!("{}", err.message);
        }
        std::process::exit(err.code);
    }
}
