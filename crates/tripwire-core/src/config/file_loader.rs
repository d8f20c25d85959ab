//! File-based settings loading

use std::fs;
use std::path::Path;

use super::settings::ResilienceSettings;
use crate::error::{ResilienceError, ResilienceResult};

/// Load settings from a file
///
/// Supports JSON, TOML, and YAML formats based on file extension.
/// Returns default settings if the file doesn't exist.
pub fn load_from_file(path: &Path) -> ResilienceResult<ResilienceSettings> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Settings file not found, using defaults");
        return Ok(ResilienceSettings::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        ResilienceError::io(
            format!("Failed to read settings file: {}", e),
            path.display().to_string(),
        )
    })?;

    let settings = match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content)
            .map_err(|e| ResilienceError::parse("TOML", format!("{}: {}", path.display(), e)))?,
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .map_err(|e| ResilienceError::parse("YAML", format!("{}: {}", path.display(), e)))?,
        _ => serde_json::from_str(&content)
            .map_err(|e| ResilienceError::parse("JSON", format!("{}: {}", path.display(), e)))?,
    };

    Ok(settings)
}
