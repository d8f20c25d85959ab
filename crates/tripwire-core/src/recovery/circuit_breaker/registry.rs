//! Circuit breaker registry for managing one breaker per downstream service

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::time::Instant;

use super::breaker::CircuitBreaker;
use super::types::{CircuitBreakerConfig, CircuitBreakerStats, StatsReport};

/// Collection of circuit breakers keyed by service name
///
/// Build one per process and share it behind an `Arc`. Entries are only
/// ever added; a breaker lives as long as the registry.
#[derive(Debug)]
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    default_config: CircuitBreakerConfig,
}

impl CircuitBreakerRegistry {
    /// Create a new registry with default config
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    /// Create a registry with custom default config
    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            breakers: DashMap::new(),
            default_config: config,
        }
    }

    /// Config used for breakers created without an explicit one
    pub fn default_config(&self) -> &CircuitBreakerConfig {
        &self.default_config
    }

    /// Get or create the breaker for a service
    ///
    /// The config only matters when the breaker does not exist yet; later
    /// calls get the existing breaker whatever config they pass.
    pub fn get_breaker(
        &self,
        name: &str,
        config: Option<CircuitBreakerConfig>,
    ) -> Arc<CircuitBreaker> {
        if let Some(existing) = self.breakers.get(name) {
            return existing.clone();
        }

        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| {
                let config = config.unwrap_or_else(|| self.default_config.clone());
                tracing::debug!(circuit = %name, "Registering circuit breaker");
                Arc::new(CircuitBreaker::with_config(name, config))
            })
            .clone()
    }

    /// Get or create a circuit breaker with the registry default config
    pub fn get(&self, name: &str) -> Arc<CircuitBreaker> {
        self.get_breaker(name, None)
    }

    /// Get an existing breaker without creating one
    pub fn lookup(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(name).map(|entry| entry.value().clone())
    }

    /// Get all circuit breaker names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.breakers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Number of registered breakers
    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Get stats for all circuit breakers
    pub fn all_stats(&self) -> BTreeMap<String, CircuitBreakerStats> {
        self.breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().stats()))
            .collect()
    }

    /// Serializable stats for all circuit breakers
    pub fn stats_report(&self) -> BTreeMap<String, StatsReport> {
        self.all_stats()
            .into_iter()
            .map(|(name, stats)| (name, stats.report()))
            .collect()
    }

    /// Reset all circuit breakers to closed
    pub fn reset_all(&self) {
        for entry in self.breakers.iter() {
            entry.value().reset();
        }
        tracing::info!(count = self.breakers.len(), "Reset all circuit breakers");
    }

    /// Decay stale counters on every breaker
    ///
    /// Meant to be called on a schedule owned by the caller (see
    /// [`crate::recovery::spawn_maintenance`]). Returns how many breakers
    /// had a counter cleared.
    pub fn run_maintenance(&self) -> usize {
        let now = Instant::now();
        let decayed = self
            .breakers
            .iter()
            .filter(|entry| entry.value().decay_stale(now))
            .count();

        tracing::debug!(
            breakers = self.breakers.len(),
            decayed,
            "Circuit breaker maintenance finished"
        );
        decayed
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
