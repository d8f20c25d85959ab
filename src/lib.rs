//! Tripwire
//!
//! Circuit breakers and resilience middleware for calls to downstream
//! services. This crate re-exports the public API of `tripwire-core`.

pub use tripwire_core::*;
