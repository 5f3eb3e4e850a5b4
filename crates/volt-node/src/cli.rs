//! CLI argument parsing for volt

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Volt transaction execution engine
#[derive(Parser, Debug, Clone)]
#[command(name = "volt")]
#[command(about = "Volt transaction execution engine")]
#[command(version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error), used when RUST_LOG is unset
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Execute one transaction against a genesis state and print its receipt
    Execute(ExecuteArgs),
}

/// Arguments of `volt execute`
#[derive(Args, Debug, Clone)]
pub struct ExecuteArgs {
    /// Genesis file path
    #[arg(long)]
    pub genesis: PathBuf,

    /// Transaction request file path
    #[arg(long)]
    pub tx: PathBuf,

    /// Block timestamp, defaults to the genesis timestamp
    #[arg(long)]
    pub time: Option<u64>,

    /// Block number
    #[arg(long, default_value = "1")]
    pub number: u32,

    /// Block gas limit
    #[arg(long, default_value = "10000000")]
    pub gas_limit: u64,

    /// Runtime configuration file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print execution metrics after the receipt
    #[arg(long)]
    pub metrics: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
