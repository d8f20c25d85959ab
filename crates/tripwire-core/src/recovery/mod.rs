//! Failure isolation for calls to downstream services
//!
//! This module provides:
//! - Circuit breakers, one per downstream service, kept in a registry
//! - Middleware that routes calls through the breaker for a named service
//! - Opt-in periodic maintenance that decays stale failure counters
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tripwire_core::recovery::{CircuitBreakerMiddleware, CircuitBreakerRegistry};
//!
//! let registry = Arc::new(CircuitBreakerRegistry::new());
//! let middleware = CircuitBreakerMiddleware::from_env(registry.clone());
//!
//! let order = middleware
//!     .execute_with_breaker("payment-gateway", || client.create_order(&cart), None)
//!     .await?;
//! ```

pub mod circuit_breaker;
mod maintenance;
mod middleware;

pub use circuit_breaker::{
    CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerRegistry,
    CircuitBreakerStats, CircuitOpenError, CircuitState, OpenReason, StatsReport,
};
pub use maintenance::spawn_maintenance;
pub use middleware::CircuitBreakerMiddleware;
