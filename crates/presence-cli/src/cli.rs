//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log file path, overriding the configuration
    #[arg(short, long)]
    pub log_path: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scheduler loop; stdin lines are inbound commands
    Run {
        /// Start with a peer already connected
        #[arg(long)]
        connected: bool,
        /// Stop after this many milliseconds
        #[arg(short, long)]
        duration_ms: Option<u64>,
        /// Disable the simulated radio
        #[arg(long)]
        no_scan: bool,
    },
    /// Reassemble a transcript of notification payloads, one per line
    Decode {
        /// Transcript file
        file: String,
        /// Emit one JSON object per message
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}
