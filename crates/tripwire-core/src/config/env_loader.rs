//! Environment variable-based settings overrides

use humantime_serde::re::humantime;
use std::str::FromStr;
use std::time::Duration;

use super::defaults::{ENABLED_ENV_VAR, ENV_PREFIX};
use super::settings::ResilienceSettings;
use crate::error::{ResilienceError, ResilienceResult};

/// Interpret the value of the master switch
///
/// Only the exact string `false` turns protection off; anything else,
/// including an unset variable, leaves it on.
pub fn toggle_from_value(value: Option<&str>) -> bool {
    value != Some("false")
}

/// Apply `TRIPWIRE_*` overrides and the master switch to `settings`
///
/// `lookup` resolves a variable name to its value, which keeps the loader
/// independent of the real process environment.
pub fn apply_env_overrides<F>(
    mut settings: ResilienceSettings,
    lookup: F,
) -> ResilienceResult<ResilienceSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

    if let Some(value) = var("ENABLED") {
        settings.enabled = parse_value("ENABLED", &value)?;
    }
    if let Some(value) = var("MAINTENANCE_INTERVAL") {
        settings.maintenance_interval = parse_duration("MAINTENANCE_INTERVAL", &value)?;
    }
    if let Some(value) = var("FAILURE_THRESHOLD") {
        settings.defaults.failure_threshold = parse_value("FAILURE_THRESHOLD", &value)?;
    }
    if let Some(value) = var("RECOVERY_TIMEOUT") {
        settings.defaults.recovery_timeout = parse_duration("RECOVERY_TIMEOUT", &value)?;
    }
    if let Some(value) = var("MONITORING_PERIOD") {
        settings.defaults.monitoring_period = parse_duration("MONITORING_PERIOD", &value)?;
    }
    if let Some(value) = var("SUCCESS_THRESHOLD") {
        settings.defaults.success_threshold = parse_value("SUCCESS_THRESHOLD", &value)?;
    }
    if let Some(value) = var("LOG_LEVEL") {
        settings.logging.level = value;
    }
    if let Some(value) = var("LOG_FORMAT") {
        settings.logging.format = parse_value("LOG_FORMAT", &value)?;
    }

    // The master switch can only turn protection off
    if !toggle_from_value(lookup(ENABLED_ENV_VAR).as_deref()) {
        settings.enabled = false;
    }

    Ok(settings)
}

fn parse_value<T: FromStr>(name: &str, value: &str) -> ResilienceResult<T> {
    value.trim().parse().map_err(|_| {
        ResilienceError::config_with_context(
            format!("Invalid {}{} value", ENV_PREFIX, name),
            format!("Parsing '{}'", value),
        )
    })
}

fn parse_duration(name: &str, value: &str) -> ResilienceResult<Duration> {
    humantime::parse_duration(value.trim()).map_err(|e| {
        ResilienceError::config_with_context(
            format!("Invalid {}{} value: {}", ENV_PREFIX, name, e),
            format!("Parsing duration '{}'", value),
        )
    })
}
