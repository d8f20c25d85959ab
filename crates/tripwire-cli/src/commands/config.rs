//! Settings inspection commands

use anyhow::{Context, Result};
use std::path::Path;
use tripwire_core::ResilienceSettings;
use tripwire_core::config::load_from_file;

use crate::console::CliConsole;

/// Print the effective settings as TOML
pub fn show(settings: &ResilienceSettings) -> Result<()> {
    let rendered = toml::to_string_pretty(settings).context("Failed to render settings")?;
    print!("{}", rendered);
    Ok(())
}

/// Load and validate a settings file
pub fn check(path: &Path) -> Result<()> {
    let console = CliConsole::new(true);

    if !path.exists() {
        console.error(&format!("{} does not exist", path.display()));
        anyhow::bail!("settings file not found: {}", path.display());
    }

    let settings = load_from_file(path)
        .and_then(|settings| settings.validate().map(|_| settings))
        .map_err(|e| {
            console.error(&e.to_string());
            e
        })?;

    console.success(&format!("{} is valid", path.display()));
    console.info(&format!(
        "protection {}, {} service override(s)",
        if settings.enabled { "enabled" } else { "disabled" },
        settings.services.len()
    ));
    Ok(())
}
