//! CLI argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tripwire")]
#[command(about = "Tripwire - circuit breakers for calls to downstream services")]
#[command(version)]
pub struct Cli {
    /// Path to a settings file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "TRIPWIRE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect and validate settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Replay a scripted sequence of outcomes through a circuit breaker
    #[command(verbatim_doc_comment)]
    Simulate {
        /// Downstream service name
        #[arg(long, default_value = "payment-gateway")]
        service: String,

        /// Outcomes in order: `s` for success, `f` for failure (e.g. "ffsffs")
        #[arg(long)]
        pattern: String,

        /// Delay between calls in milliseconds
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,

        /// Run the maintenance task while simulating
        #[arg(long)]
        maintenance: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigAction {
    /// Print the effective settings as TOML
    Show,

    /// Validate a settings file
    Check {
        /// Settings file to validate
        path: PathBuf,
    },
}
