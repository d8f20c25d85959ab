//! Tripwire CLI application
//!
//! Operator tooling around the circuit breaker library:
//!
//! - `tripwire config show`: print the effective settings
//! - `tripwire config check <path>`: validate a settings file
//! - `tripwire simulate --service <name> --pattern <s|f...>`: replay a
//!   scripted sequence of downstream outcomes through the middleware and
//!   print the resulting breaker stats

mod args;
mod commands;
mod console;
mod logging;
mod router;

use anyhow::Result;
use clap::Parser;

use args::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = tripwire_core::load_settings(cli.config.as_deref())?;

    // RUST_LOG takes precedence over the configured level
    logging::init(&settings.logging, cli.verbose);

    router::route(cli, settings).await
}
