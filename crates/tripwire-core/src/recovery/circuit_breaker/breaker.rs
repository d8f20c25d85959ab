//! Circuit breaker implementation

use parking_lot::Mutex;
use std::future::Future;
use tokio::time::Instant;

use super::types::{
    CircuitBreakerConfig, CircuitBreakerError, CircuitBreakerStats, CircuitOpenError,
    CircuitState, OpenReason,
};

/// Mutable part of a breaker, always read and written under one lock.
#[derive(Debug)]
struct BreakerState {
    state: CircuitState,
    failures: u32,
    successes: u32,
    last_failure: Option<Instant>,
    last_success: Option<Instant>,
    /// Set while open; earliest instant a probe is let through
    next_attempt: Option<Instant>,
    /// Probes admitted in the current half-open period and not yet finished
    in_flight_probes: u32,
    /// Bumped on every entry into half-open so stale probe permits are ignored
    probe_epoch: u64,
}

impl BreakerState {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failures: 0,
            successes: 0,
            last_failure: None,
            last_success: None,
            next_attempt: None,
            in_flight_probes: 0,
            probe_epoch: 0,
        }
    }
}

/// Circuit breaker for protecting against a failing dependency
///
/// The state lock is only held for the synchronous bookkeeping before and
/// after an operation runs, never across an `.await`.
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Dependency name (for logging and stats)
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerState>,
}

/// Permission to run one operation through a breaker
///
/// Report the outcome with [`CallPermit::record_success`] or
/// [`CallPermit::record_failure`]. Dropping the permit without reporting
/// records nothing, but frees the probe slot it may hold.
#[must_use = "report the outcome with record_success or record_failure"]
#[derive(Debug)]
pub struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    probe_epoch: Option<u64>,
}

impl CallPermit<'_> {
    /// True when this call is a half-open probe
    pub fn is_probe(&self) -> bool {
        self.probe_epoch.is_some()
    }

    /// Report that the operation succeeded
    pub fn record_success(mut self) {
        let epoch = self.probe_epoch.take();
        self.breaker.on_success(epoch);
    }

    /// Report that the operation failed
    pub fn record_failure(mut self) {
        let epoch = self.probe_epoch.take();
        self.breaker.on_failure(epoch);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if let Some(epoch) = self.probe_epoch.take() {
            let mut inner = self.breaker.inner.lock();
            CircuitBreaker::release_probe(&mut inner, epoch);
        }
    }
}

impl CircuitBreaker {
    /// Create a new circuit breaker with default config
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, CircuitBreakerConfig::default())
    }

    /// Create a new circuit breaker with custom config
    ///
    /// An invalid config is logged but still used: a zero threshold opens
    /// on the first failure or closes on the first probe success.
    pub fn with_config(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        if let Err(e) = config.validate() {
            tracing::warn!(
                circuit = %name,
                error = %e,
                "Circuit breaker created with invalid config"
            );
        }
        Self {
            name,
            config,
            inner: Mutex::new(BreakerState::new()),
        }
    }

    /// Get the dependency name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the configuration this breaker was created with
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Get the current state
    ///
    /// This is a plain read: an open breaker whose recovery timeout has
    /// passed still reports `Open` until the next call moves it to
    /// half-open.
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// Execute an operation with circuit breaker protection
    ///
    /// When the circuit is open the operation is not invoked and the call
    /// fails with [`CircuitBreakerError::Open`]. Otherwise the operation
    /// runs, its outcome is recorded, and its value or error is handed back
    /// unchanged.
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let permit = self.try_acquire()?;

        match operation().await {
            Ok(value) => {
                permit.record_success();
                Ok(value)
            }
            Err(e) => {
                permit.record_failure();
                Err(CircuitBreakerError::Operation(e))
            }
        }
    }

    /// Ask for permission to run an operation
    ///
    /// Moves an open breaker to half-open once its recovery timeout has
    /// passed; the returned permit is then a probe.
    pub fn try_acquire(&self) -> Result<CallPermit<'_>, CircuitOpenError> {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        if inner.state == CircuitState::Open {
            let next_attempt = inner.next_attempt;
            match next_attempt {
                Some(at) if now < at => {
                    return Err(CircuitOpenError {
                        name: self.name.clone(),
                        reason: OpenReason::Open,
                        retry_after: Some(at - now),
                    });
                }
                _ => self.transition_to_half_open(&mut inner),
            }
        }

        let state = inner.state;
        match state {
            CircuitState::HalfOpen => {
                if let Some(max) = self.config.half_open_max_probes {
                    if inner.in_flight_probes >= max {
                        return Err(CircuitOpenError {
                            name: self.name.clone(),
                            reason: OpenReason::ProbeLimit,
                            retry_after: None,
                        });
                    }
                }
                inner.in_flight_probes += 1;
                Ok(CallPermit {
                    breaker: self,
                    probe_epoch: Some(inner.probe_epoch),
                })
            }
            _ => Ok(CallPermit {
                breaker: self,
                probe_epoch: None,
            }),
        }
    }

    /// Get circuit breaker statistics
    pub fn stats(&self) -> CircuitBreakerStats {
        let inner = self.inner.lock();
        CircuitBreakerStats {
            state: inner.state,
            failures: inner.failures,
            successes: inner.successes,
            last_failure: inner.last_failure,
            last_success: inner.last_success,
            next_attempt: inner.next_attempt,
        }
    }

    /// Manually reset the circuit breaker to closed state
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        self.transition_to_closed(&mut inner);
    }

    /// Manually open the circuit breaker
    pub fn trip(&self) {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        self.transition_to_open(&mut inner, now);
    }

    /// Clear counters whose last event is older than the monitoring period
    ///
    /// State and the next attempt time are left alone. Returns true when a
    /// counter was cleared.
    pub fn decay_stale(&self, now: Instant) -> bool {
        let period = self.config.monitoring_period;
        let mut inner = self.inner.lock();
        let mut decayed = false;

        if let Some(at) = inner.last_failure {
            if inner.failures > 0 && now.saturating_duration_since(at) > period {
                inner.failures = 0;
                decayed = true;
            }
        }
        if let Some(at) = inner.last_success {
            if inner.successes > 0 && now.saturating_duration_since(at) > period {
                inner.successes = 0;
                decayed = true;
            }
        }

        if decayed {
            tracing::debug!(circuit = %self.name, state = %inner.state, "Decayed stale counters");
        }
        decayed
    }

    fn on_success(&self, probe_epoch: Option<u64>) {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        if let Some(epoch) = probe_epoch {
            Self::release_probe(&mut inner, epoch);
        }
        inner.last_success = Some(now);

        let state = inner.state;
        match state {
            CircuitState::Closed => {
                inner.failures = 0;
            }
            CircuitState::HalfOpen => {
                inner.successes = inner.successes.saturating_add(1);
                if inner.successes >= self.config.success_threshold {
                    self.transition_to_closed(&mut inner);
                }
            }
            CircuitState::Open => {
                // Late completion of a call admitted before the circuit opened
            }
        }
    }

    fn on_failure(&self, probe_epoch: Option<u64>) {
        let now = Instant::now();
        let mut inner = self.inner.lock();
        if let Some(epoch) = probe_epoch {
            Self::release_probe(&mut inner, epoch);
        }
        inner.failures = inner.failures.saturating_add(1);
        inner.last_failure = Some(now);

        let state = inner.state;
        match state {
            CircuitState::Closed => {
                if inner.failures >= self.config.failure_threshold {
                    self.transition_to_open(&mut inner, now);
                }
            }
            CircuitState::HalfOpen => {
                // Any failure while probing reopens the circuit
                self.transition_to_open(&mut inner, now);
            }
            CircuitState::Open => {}
        }
    }

    fn release_probe(inner: &mut BreakerState, epoch: u64) {
        if inner.state == CircuitState::HalfOpen && inner.probe_epoch == epoch {
            inner.in_flight_probes = inner.in_flight_probes.saturating_sub(1);
        }
    }

    fn transition_to_open(&self, inner: &mut BreakerState, now: Instant) {
        let previous = inner.state;
        inner.state = CircuitState::Open;
        inner.next_attempt = Some(now + self.config.recovery_timeout);
        inner.successes = 0;
        inner.in_flight_probes = 0;

        tracing::warn!(
            circuit = %self.name,
            from = %previous,
            failures = inner.failures,
            retry_in_ms = self.config.recovery_timeout.as_millis() as u64,
            "Circuit breaker opened"
        );
    }

    fn transition_to_half_open(&self, inner: &mut BreakerState) {
        inner.state = CircuitState::HalfOpen;
        inner.successes = 0;
        inner.next_attempt = None;
        inner.in_flight_probes = 0;
        inner.probe_epoch = inner.probe_epoch.wrapping_add(1);

        tracing::info!(
            circuit = %self.name,
            "Circuit breaker transitioning to half-open"
        );
    }

    fn transition_to_closed(&self, inner: &mut BreakerState) {
        let previous = inner.state;
        inner.state = CircuitState::Closed;
        inner.failures = 0;
        inner.successes = 0;
        inner.next_attempt = None;
        inner.in_flight_probes = 0;

        tracing::info!(
            circuit = %self.name,
            from = %previous,
            "Circuit breaker closed"
        );
    }
}
