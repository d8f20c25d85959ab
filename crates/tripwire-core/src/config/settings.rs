//! Top-level resilience settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use super::defaults;
use super::logging_config::LoggingConfig;
use crate::error::{ResilienceError, ResilienceResult};
use crate::recovery::CircuitBreakerConfig;

/// Settings for the middleware, the registry and logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceSettings {
    /// Master switch for circuit breaker protection
    pub enabled: bool,
    /// Interval for the maintenance task
    #[serde(with = "humantime_serde")]
    pub maintenance_interval: Duration,
    /// Policy for services without an override
    pub defaults: CircuitBreakerConfig,
    /// Per-service policy overrides keyed by service name
    pub services: HashMap<String, CircuitBreakerConfig>,
    pub logging: LoggingConfig,
}

impl Default for ResilienceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            maintenance_interval: Duration::from_millis(defaults::MAINTENANCE_INTERVAL_MS),
            defaults: CircuitBreakerConfig::default(),
            services: HashMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ResilienceSettings {
    /// Validate the default policy and every override
    pub fn validate(&self) -> ResilienceResult<()> {
        if self.maintenance_interval.is_zero() {
            return Err(ResilienceError::config(
                "maintenance_interval must be greater than zero",
            ));
        }

        self.defaults.validate().map_err(|e| {
            ResilienceError::config_with_context(e.to_string(), "validating default policy")
        })?;

        for (service, config) in &self.services {
            config.validate().map_err(|e| {
                ResilienceError::config_with_context(
                    e.to_string(),
                    format!("validating policy for service '{}'", service),
                )
            })?;
        }

        Ok(())
    }
}
