//! Volt command-line harness
//!
//! Loads a genesis state, signs a transaction request, executes it and prints
//! the receipt as JSON.

mod cli;
mod config;
mod execute;

use std::process::ExitCode;

use anyhow::Result;
use cli::{Cli, Command};
use execute::Outcome;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit status for a transaction rejected before execution
const EXIT_REJECTED: u8 = 2;

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    // logs go to stderr so stdout carries only the receipt
    if cli.log_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse_args();
    init_tracing(&cli);

    match &cli.command {
        Command::Execute(args) => match execute::run(args)? {
            Outcome::Executed { receipt, metrics } => {
                println!("{}", receipt.to_json()?);
                if let Some(metrics) = metrics {
                    eprintln!("{metrics}");
                }
                Ok(ExitCode::SUCCESS)
            }
            Outcome::Rejected(err) => {
                eprintln!("transaction rejected: {err}");
                Ok(ExitCode::from(EXIT_REJECTED))
            }
        },
    }
}
