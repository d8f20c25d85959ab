//! Circuit breaker pattern for fault tolerance
//!
//! Prevents cascading failures by temporarily refusing calls to a failing
//! dependency.
//!
//! ```text
//! Closed → Open:      failures reach failure_threshold
//! Open → HalfOpen:    first call after recovery_timeout
//! HalfOpen → Closed:  success_threshold probe successes
//! HalfOpen → Open:    any probe failure
//! ```

mod breaker;
mod registry;
mod types;

#[cfg(test)]
mod tests;

// Re-export all public items
pub use breaker::{CallPermit, CircuitBreaker};
pub use registry::CircuitBreakerRegistry;
pub use types::{
    CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerStats, CircuitOpenError,
    CircuitState, OpenReason, StatsReport,
};
