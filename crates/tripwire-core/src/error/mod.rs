//! Error types for Tripwire
//!
//! Crate-level failures (configuration, file access, parsing) are reported
//! through [`ResilienceError`]. Call-path failures produced by a circuit
//! breaker live next to the breaker in [`crate::recovery::circuit_breaker`].

mod types;

pub use types::{ResilienceError, ResilienceResult};
