//! Circuit breaker types and configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::defaults;
use crate::error::{ResilienceError, ResilienceResult};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Circuit is closed, operations proceed normally
    Closed,
    /// Circuit is open, operations are rejected
    Open,
    /// Circuit is half-open, probe operations test recovery
    HalfOpen,
}

impl CircuitState {
    /// Upper-case name used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::HalfOpen => "HALF_OPEN",
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for circuit breaker behavior
///
/// Fixed once a breaker is created; the registry keeps the config supplied
/// by whichever caller created the breaker first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Number of failures in the closed state before opening the circuit
    pub failure_threshold: u32,
    /// Time the circuit stays open before a probe is let through
    #[serde(with = "humantime_serde")]
    pub recovery_timeout: Duration,
    /// Counters whose last event is older than this are cleared by maintenance
    #[serde(with = "humantime_serde")]
    pub monitoring_period: Duration,
    /// Number of probe successes in the half-open state needed to close
    pub success_threshold: u32,
    /// Maximum concurrent probes in the half-open state (`None` = unbounded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub half_open_max_probes: Option<u32>,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: defaults::FAILURE_THRESHOLD,
            recovery_timeout: Duration::from_millis(defaults::RECOVERY_TIMEOUT_MS),
            monitoring_period: Duration::from_millis(defaults::MONITORING_PERIOD_MS),
            success_threshold: defaults::SUCCESS_THRESHOLD,
            half_open_max_probes: None,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a config for aggressive circuit breaking
    pub fn aggressive() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(15),
            monitoring_period: Duration::from_secs(60),
            success_threshold: 1,
            half_open_max_probes: Some(1),
        }
    }

    /// Create a config for lenient circuit breaking
    pub fn lenient() -> Self {
        Self {
            failure_threshold: 10,
            recovery_timeout: Duration::from_secs(120),
            monitoring_period: Duration::from_secs(600),
            success_threshold: 5,
            half_open_max_probes: None,
        }
    }

    /// Check that every threshold and period is usable
    pub fn validate(&self) -> ResilienceResult<()> {
        if self.failure_threshold == 0 {
            return Err(ResilienceError::config(
                "failure_threshold must be at least 1",
            ));
        }
        if self.success_threshold == 0 {
            return Err(ResilienceError::config(
                "success_threshold must be at least 1",
            ));
        }
        if self.recovery_timeout.is_zero() {
            return Err(ResilienceError::config(
                "recovery_timeout must be greater than zero",
            ));
        }
        if self.monitoring_period.is_zero() {
            return Err(ResilienceError::config(
                "monitoring_period must be greater than zero",
            ));
        }
        if self.half_open_max_probes == Some(0) {
            return Err(ResilienceError::config(
                "half_open_max_probes must be at least 1 when set",
            ));
        }
        Ok(())
    }
}

/// Why a circuit breaker refused a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenReason {
    /// Circuit is open and the recovery timeout has not elapsed
    Open,
    /// Circuit is half-open and every probe slot is taken
    ProbeLimit,
}

impl fmt::Display for OpenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenReason::Open => write!(f, "is open"),
            OpenReason::ProbeLimit => write!(f, "is half-open and at its probe limit"),
        }
    }
}

/// Error returned when a circuit breaker refuses to run an operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Circuit breaker for '{name}' {reason}")]
pub struct CircuitOpenError {
    /// Name of the breaker (the downstream service)
    pub name: String,
    pub reason: OpenReason,
    /// Time left until the breaker accepts a probe, when known
    pub retry_after: Option<Duration>,
}

/// Outcome of a call guarded by a circuit breaker
///
/// `Operation` carries the operation's own error value exactly as it was
/// returned; the breaker never converts or re-formats it.
#[derive(Debug)]
pub enum CircuitBreakerError<E> {
    /// The breaker refused the call; the operation was not invoked
    Open(CircuitOpenError),
    /// The operation ran and failed
    Operation(E),
}

impl<E> CircuitBreakerError<E> {
    /// True when the call was refused without running the operation
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }

    /// Borrow the operation's error, if the operation ran
    pub fn operation(&self) -> Option<&E> {
        match self {
            Self::Operation(e) => Some(e),
            Self::Open(_) => None,
        }
    }

    /// Take the operation's error, if the operation ran
    pub fn into_operation(self) -> Option<E> {
        match self {
            Self::Operation(e) => Some(e),
            Self::Open(_) => None,
        }
    }

    /// Map the operation's error, leaving refusals untouched
    pub fn map_operation<F, E2>(self, f: F) -> CircuitBreakerError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            Self::Open(open) => CircuitBreakerError::Open(open),
            Self::Operation(e) => CircuitBreakerError::Operation(f(e)),
        }
    }
}

impl<E> From<CircuitOpenError> for CircuitBreakerError<E> {
    fn from(err: CircuitOpenError) -> Self {
        Self::Open(err)
    }
}

impl<E: fmt::Display> fmt::Display for CircuitBreakerError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(open) => write!(f, "{}", open),
            Self::Operation(e) => write!(f, "{}", e),
        }
    }
}

impl<E> std::error::Error for CircuitBreakerError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open(open) => Some(open),
            Self::Operation(e) => Some(e),
        }
    }
}

/// Statistics for a circuit breaker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerStats {
    pub state: CircuitState,
    pub failures: u32,
    pub successes: u32,
    pub last_failure: Option<Instant>,
    pub last_success: Option<Instant>,
    pub next_attempt: Option<Instant>,
}

impl CircuitBreakerStats {
    /// Convert to a serializable report with wall-clock timestamps
    pub fn report(&self) -> StatsReport {
        let now = Instant::now();
        let wall_now = Utc::now();
        let convert = |at: Option<Instant>| at.and_then(|at| wall_clock(at, now, wall_now));

        StatsReport {
            state: self.state,
            failures: self.failures,
            successes: self.successes,
            last_failure_time: convert(self.last_failure),
            last_success_time: convert(self.last_success),
            next_attempt_time: convert(self.next_attempt),
        }
    }
}

/// Serializable breaker snapshot for dashboards and the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsReport {
    pub state: CircuitState,
    pub failures: u32,
    pub successes: u32,
    pub last_failure_time: Option<DateTime<Utc>>,
    pub last_success_time: Option<DateTime<Utc>>,
    pub next_attempt_time: Option<DateTime<Utc>>,
}

fn wall_clock(at: Instant, now: Instant, wall_now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if at <= now {
        let ago = chrono::Duration::from_std(now - at).ok()?;
        wall_now.checked_sub_signed(ago)
    } else {
        let ahead = chrono::Duration::from_std(at - now).ok()?;
        wall_now.checked_add_signed(ahead)
    }
}
