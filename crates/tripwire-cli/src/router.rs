//! Command routing logic for CLI

use anyhow::Result;
use tripwire_core::ResilienceSettings;

use crate::args::{Cli, Commands, ConfigAction};
use crate::commands;

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli, settings: ResilienceSettings) -> Result<()> {
    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&settings),
            ConfigAction::Check { path } => commands::config::check(&path),
        },
        Commands::Simulate {
            service,
            pattern,
            delay_ms,
            maintenance,
        } => {
            let options = commands::simulate::SimulateOptions {
                service,
                pattern,
                delay_ms,
                maintenance,
                verbose: cli.verbose,
            };
            commands::simulate::run(&settings, options).await
        }
    }
}
