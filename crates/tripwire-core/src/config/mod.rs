//! Configuration for Tripwire
//!
//! Settings are layered: built-in defaults, then an optional settings file
//! (TOML, YAML or JSON), then `TRIPWIRE_*` environment variables, then the
//! `CIRCUIT_BREAKER_ENABLED` master switch.

pub mod defaults;
mod env_loader;
mod file_loader;
mod logging_config;
mod settings;

pub use defaults::ENABLED_ENV_VAR;
pub use env_loader::{apply_env_overrides, toggle_from_value};
pub use file_loader::load_from_file;
pub use logging_config::{LogFormat, LoggingConfig};
pub use settings::ResilienceSettings;

use crate::error::ResilienceResult;
use std::path::Path;

/// Load settings from an optional file plus the process environment
///
/// The result is validated before it is returned.
pub fn load_settings(path: Option<&Path>) -> ResilienceResult<ResilienceSettings> {
    let settings = match path {
        Some(path) => load_from_file(path)?,
        None => ResilienceSettings::default(),
    };
    let settings = apply_env_overrides(settings, |key| std::env::var(key).ok())?;
    settings.validate()?;
    Ok(settings)
}
