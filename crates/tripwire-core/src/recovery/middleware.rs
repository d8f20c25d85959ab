//! Call-site wrapper that routes operations through named circuit breakers
//!
//! Call sites name the downstream service and hand over the operation; the
//! middleware decides whether protection is active and which breaker guards
//! the call.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use super::circuit_breaker::{CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerRegistry};
use crate::config::{ENABLED_ENV_VAR, ResilienceSettings, toggle_from_value};

/// Circuit breaker middleware with a process-wide on/off switch
#[derive(Debug, Clone)]
pub struct CircuitBreakerMiddleware {
    registry: Arc<CircuitBreakerRegistry>,
    enabled: bool,
    service_configs: HashMap<String, CircuitBreakerConfig>,
}

impl CircuitBreakerMiddleware {
    /// Create middleware over a shared registry
    pub fn new(registry: Arc<CircuitBreakerRegistry>, enabled: bool) -> Self {
        if !enabled {
            tracing::info!("Circuit breaker protection disabled, calls pass straight through");
        }
        Self {
            registry,
            enabled,
            service_configs: HashMap::new(),
        }
    }

    /// Create middleware, reading the toggle from `CIRCUIT_BREAKER_ENABLED`
    ///
    /// Only the exact value `false` disables protection.
    pub fn from_env(registry: Arc<CircuitBreakerRegistry>) -> Self {
        let value = std::env::var(ENABLED_ENV_VAR).ok();
        Self::new(registry, toggle_from_value(value.as_deref()))
    }

    /// Create middleware from loaded settings, including per-service configs
    pub fn from_settings(registry: Arc<CircuitBreakerRegistry>, settings: &ResilienceSettings) -> Self {
        let mut middleware = Self::new(registry, settings.enabled);
        middleware.service_configs = settings.services.clone();
        middleware
    }

    /// Add a config used when the named service's breaker is first created
    pub fn with_service_config(
        mut self,
        service: impl Into<String>,
        config: CircuitBreakerConfig,
    ) -> Self {
        self.service_configs.insert(service.into(), config);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn registry(&self) -> &Arc<CircuitBreakerRegistry> {
        &self.registry
    }

    /// Run an operation guarded by the breaker for `service`
    ///
    /// When disabled the operation is invoked directly: nothing is tracked
    /// and no call is ever refused. When enabled, the breaker is looked up
    /// (or created with `config`, the service's configured override, or the
    /// registry default, in that order) and the call goes through it.
    pub async fn execute_with_breaker<T, E, F, Fut>(
        &self,
        service: &str,
        operation: F,
        config: Option<CircuitBreakerConfig>,
    ) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.enabled {
            return operation().await.map_err(CircuitBreakerError::Operation);
        }

        let config = config.or_else(|| self.service_configs.get(service).cloned());
        let breaker = self.registry.get_breaker(service, config);
        breaker.execute(operation).await
    }
}
