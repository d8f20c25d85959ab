//! Tripwire Core Library
//!
//! Circuit breakers for calls to downstream services: a per-service breaker
//! state machine, a registry that owns the breakers, middleware with a
//! process-wide on/off switch, and the settings that configure them.

pub mod config;
pub mod error;
pub mod recovery;

// Re-export commonly used types
pub use config::{LoggingConfig, ResilienceSettings, load_settings};
pub use error::{ResilienceError, ResilienceResult};
pub use recovery::{
    CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError,
    CircuitBreakerMiddleware, CircuitBreakerRegistry, CircuitBreakerStats, CircuitOpenError,
    CircuitState, OpenReason, StatsReport, spawn_maintenance,
};
