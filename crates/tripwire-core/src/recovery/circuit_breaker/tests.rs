//! Tests for circuit breaker functionality

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use super::*;

type CallResult = Result<u32, CircuitBreakerError<&'static str>>;

async fn fail(cb: &CircuitBreaker) -> CallResult {
    cb.execute(|| async { Err("downstream unavailable") }).await
}

async fn succeed(cb: &CircuitBreaker) -> CallResult {
    cb.execute(|| async { Ok(7) }).await
}

fn quick_config(failure_threshold: u32, success_threshold: u32) -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        failure_threshold,
        success_threshold,
        recovery_timeout: Duration::from_millis(100),
        monitoring_period: Duration::from_secs(10),
        half_open_max_probes: None,
    }
}

// =========================================================================
// INITIAL STATE
// =========================================================================

#[tokio::test]
async fn test_circuit_starts_closed() {
    let cb = CircuitBreaker::new("test");
    let stats = cb.stats();

    assert_eq!(cb.state(), CircuitState::Closed);
    assert_eq!(stats.failures, 0);
    assert_eq!(stats.successes, 0);
    assert!(stats.last_failure.is_none());
    assert!(stats.last_success.is_none());
    assert!(stats.next_attempt.is_none());
}

#[test]
fn test_default_config_values() {
    let config = CircuitBreakerConfig::default();
    assert_eq!(config.failure_threshold, 5);
    assert_eq!(config.recovery_timeout, Duration::from_millis(60_000));
    assert_eq!(config.monitoring_period, Duration::from_millis(300_000));
    assert_eq!(config.success_threshold, 3);
    assert_eq!(config.half_open_max_probes, None);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation() {
    let zero_failures = CircuitBreakerConfig {
        failure_threshold: 0,
        ..Default::default()
    };
    assert!(zero_failures.validate().is_err());

    let zero_timeout = CircuitBreakerConfig {
        recovery_timeout: Duration::ZERO,
        ..Default::default()
    };
    assert!(zero_timeout.validate().is_err());

    let zero_probes = CircuitBreakerConfig {
        half_open_max_probes: Some(0),
        ..Default::default()
    };
    assert!(zero_probes.validate().is_err());

    assert!(CircuitBreakerConfig::aggressive().validate().is_ok());
    assert!(CircuitBreakerConfig::lenient().validate().is_ok());
}

// =========================================================================
// CLOSED → OPEN
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_circuit_opens_after_failures() {
    let cb = CircuitBreaker::with_config("test", quick_config(3, 1));

    let _ = fail(&cb).await;
    let _ = fail(&cb).await;
    assert_eq!(cb.state(), CircuitState::Closed);
    assert_eq!(cb.stats().failures, 2);

    let _ = fail(&cb).await;
    let stats = cb.stats();
    assert_eq!(stats.state, CircuitState::Open);
    assert_eq!(stats.failures, 3);

    let last_failure = stats.last_failure.expect("failure recorded");
    assert_eq!(
        stats.next_attempt,
        Some(last_failure + Duration::from_millis(100))
    );
}

#[tokio::test]
async fn test_success_resets_failures_when_closed() {
    let cb = CircuitBreaker::with_config("test", quick_config(2, 1));

    let _ = fail(&cb).await;
    assert_eq!(cb.stats().failures, 1);

    succeed(&cb).await.unwrap();
    assert_eq!(cb.stats().failures, 0);

    let _ = fail(&cb).await;
    assert_eq!(cb.state(), CircuitState::Closed);
    assert_eq!(cb.stats().failures, 1);
}

#[tokio::test]
async fn test_operation_error_passes_through_unchanged() {
    #[derive(Debug, PartialEq)]
    struct PaymentDeclined {
        code: u16,
    }

    let cb = CircuitBreaker::new("payments");
    let result: Result<(), _> = cb
        .execute(|| async { Err(PaymentDeclined { code: 402 }) })
        .await;

    match result {
        Err(CircuitBreakerError::Operation(e)) => assert_eq!(e, PaymentDeclined { code: 402 }),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_map_operation_keeps_refusals() {
    let cb = CircuitBreaker::with_config("ledger", quick_config(1, 1));

    let mapped = fail(&cb).await.unwrap_err().map_operation(|e| e.len());
    assert_eq!(mapped.into_operation(), Some("downstream unavailable".len()));

    let refused = succeed(&cb).await.unwrap_err().map_operation(|e| e.len());
    assert!(refused.is_open());
    assert!(refused.operation().is_none());
}

#[tokio::test]
async fn test_success_value_returned() {
    let cb = CircuitBreaker::new("test");
    assert_eq!(succeed(&cb).await.unwrap(), 7);
    assert!(cb.stats().last_success.is_some());
}

// =========================================================================
// OPEN
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_call_rejected_when_open() {
    let cb = CircuitBreaker::with_config("inventory", quick_config(1, 1));
    let _ = fail(&cb).await;

    let invoked = AtomicU32::new(0);
    let result: CallResult = cb
        .execute(|| {
            invoked.fetch_add(1, Ordering::SeqCst);
            async { Ok(1) }
        })
        .await;

    assert_eq!(invoked.load(Ordering::SeqCst), 0);
    match result {
        Err(CircuitBreakerError::Open(err)) => {
            assert_eq!(err.name, "inventory");
            assert_eq!(err.reason, OpenReason::Open);
            assert_eq!(err.retry_after, Some(Duration::from_millis(100)));
            assert_eq!(err.to_string(), "Circuit breaker for 'inventory' is open");
        }
        other => panic!("expected open circuit, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_state_read_does_not_transition() {
    let cb = CircuitBreaker::with_config("test", quick_config(1, 1));
    let _ = fail(&cb).await;

    tokio::time::advance(Duration::from_millis(500)).await;
    assert_eq!(cb.state(), CircuitState::Open);
}

#[tokio::test(start_paused = true)]
async fn test_late_failure_while_open_keeps_deadline() {
    let cb = CircuitBreaker::with_config("test", quick_config(1, 1));

    // Admitted before the circuit opened, completes after
    let permit = cb.try_acquire().unwrap();
    let _ = fail(&cb).await;
    let deadline = cb.stats().next_attempt;

    tokio::time::advance(Duration::from_millis(40)).await;
    permit.record_failure();

    let stats = cb.stats();
    assert_eq!(stats.state, CircuitState::Open);
    assert_eq!(stats.failures, 2);
    assert_eq!(stats.next_attempt, deadline);
}

// =========================================================================
// HALF-OPEN
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_probe_allowed_after_recovery_timeout() {
    let cb = CircuitBreaker::with_config("test", quick_config(1, 2));
    let _ = fail(&cb).await;

    tokio::time::advance(Duration::from_millis(100)).await;

    let invoked = AtomicU32::new(0);
    let result: CallResult = cb
        .execute(|| {
            invoked.fetch_add(1, Ordering::SeqCst);
            async { Ok(1) }
        })
        .await;

    assert_eq!(result.unwrap(), 1);
    assert_eq!(invoked.load(Ordering::SeqCst), 1);
    let stats = cb.stats();
    assert_eq!(stats.state, CircuitState::HalfOpen);
    assert_eq!(stats.successes, 1);
    assert!(stats.next_attempt.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_circuit_closes_after_successes() {
    let cb = CircuitBreaker::with_config("test", quick_config(1, 3));
    let _ = fail(&cb).await;
    tokio::time::advance(Duration::from_millis(150)).await;

    succeed(&cb).await.unwrap();
    succeed(&cb).await.unwrap();
    assert_eq!(cb.state(), CircuitState::HalfOpen);

    succeed(&cb).await.unwrap();
    let stats = cb.stats();
    assert_eq!(stats.state, CircuitState::Closed);
    assert_eq!(stats.failures, 0);
    assert_eq!(stats.successes, 0);
    assert!(stats.next_attempt.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_half_open_failure_reopens() {
    let cb = CircuitBreaker::with_config("test", quick_config(3, 3));
    for _ in 0..3 {
        let _ = fail(&cb).await;
    }
    let first_deadline = cb.stats().next_attempt.unwrap();

    tokio::time::advance(Duration::from_millis(120)).await;
    succeed(&cb).await.unwrap();
    succeed(&cb).await.unwrap();
    assert_eq!(cb.stats().successes, 2);

    let _ = fail(&cb).await;
    let stats = cb.stats();
    assert_eq!(stats.state, CircuitState::Open);
    assert_eq!(stats.successes, 0);

    let next_attempt = stats.next_attempt.unwrap();
    assert!(next_attempt > first_deadline);
    assert_eq!(
        Some(next_attempt),
        stats.last_failure.map(|at| at + Duration::from_millis(100))
    );

    // Immediately rejected again
    assert!(succeed(&cb).await.unwrap_err().is_open());
}

#[tokio::test(start_paused = true)]
async fn test_half_open_probes_unbounded_by_default() {
    let cb = CircuitBreaker::with_config("test", quick_config(1, 5));
    let _ = fail(&cb).await;
    tokio::time::advance(Duration::from_millis(100)).await;

    let first = cb.try_acquire().unwrap();
    let second = cb.try_acquire().unwrap();
    let third = cb.try_acquire().unwrap();
    assert!(first.is_probe() && second.is_probe() && third.is_probe());

    first.record_success();
    second.record_success();
    third.record_success();
    assert_eq!(cb.stats().successes, 3);
}

#[tokio::test(start_paused = true)]
async fn test_probe_limit_rejects_extra_probes() {
    let config = CircuitBreakerConfig {
        half_open_max_probes: Some(1),
        ..quick_config(1, 2)
    };
    let cb = CircuitBreaker::with_config("search", config);
    let _ = fail(&cb).await;
    tokio::time::advance(Duration::from_millis(100)).await;

    let probe = cb.try_acquire().unwrap();
    let err = cb.try_acquire().unwrap_err();
    assert_eq!(err.reason, OpenReason::ProbeLimit);
    assert!(err.retry_after.is_none());
    assert_eq!(
        err.to_string(),
        "Circuit breaker for 'search' is half-open and at its probe limit"
    );

    probe.record_success();
    let probe = cb.try_acquire().unwrap();
    probe.record_success();
    assert_eq!(cb.state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_probe_releases_slot() {
    let config = CircuitBreakerConfig {
        half_open_max_probes: Some(1),
        ..quick_config(1, 1)
    };
    let cb = CircuitBreaker::with_config("test", config);
    let _ = fail(&cb).await;
    tokio::time::advance(Duration::from_millis(100)).await;

    let probe = cb.try_acquire().unwrap();
    assert!(cb.try_acquire().is_err());
    drop(probe);

    // Nothing was recorded, but the slot is free again
    assert_eq!(cb.state(), CircuitState::HalfOpen);
    assert!(cb.stats().last_success.is_none());
    assert!(cb.try_acquire().is_ok());
}

// =========================================================================
// ADMINISTRATION & MAINTENANCE
// =========================================================================

#[tokio::test]
async fn test_reset_and_trip() {
    let cb = CircuitBreaker::with_config("test", quick_config(5, 1));

    cb.trip();
    assert_eq!(cb.state(), CircuitState::Open);
    assert!(cb.stats().next_attempt.is_some());

    cb.reset();
    let stats = cb.stats();
    assert_eq!(stats.state, CircuitState::Closed);
    assert!(stats.next_attempt.is_none());
    assert_eq!(succeed(&cb).await.unwrap(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_decay_stale_counters() {
    let cb = CircuitBreaker::with_config("test", quick_config(5, 1));
    let _ = fail(&cb).await;
    let _ = fail(&cb).await;

    tokio::time::advance(Duration::from_secs(5)).await;
    assert!(!cb.decay_stale(tokio::time::Instant::now()));
    assert_eq!(cb.stats().failures, 2);

    tokio::time::advance(Duration::from_secs(6)).await;
    assert!(cb.decay_stale(tokio::time::Instant::now()));
    let stats = cb.stats();
    assert_eq!(stats.failures, 0);
    assert_eq!(stats.state, CircuitState::Closed);
    assert!(stats.last_failure.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_decay_keeps_open_state() {
    let cb = CircuitBreaker::with_config("test", quick_config(1, 1));
    let _ = fail(&cb).await;
    let deadline = cb.stats().next_attempt;

    tokio::time::advance(Duration::from_secs(11)).await;
    assert!(cb.decay_stale(tokio::time::Instant::now()));

    let stats = cb.stats();
    assert_eq!(stats.state, CircuitState::Open);
    assert_eq!(stats.failures, 0);
    assert_eq!(stats.next_attempt, deadline);
}

// =========================================================================
// CONCURRENCY
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_failures_open_circuit() {
    let config = CircuitBreakerConfig {
        recovery_timeout: Duration::from_secs(60),
        ..quick_config(10, 1)
    };
    let cb = Arc::new(CircuitBreaker::with_config("test", config));

    let mut handles = Vec::new();
    for _ in 0..50 {
        let cb = cb.clone();
        handles.push(tokio::spawn(async move {
            let _ = cb
                .execute(|| async {
                    tokio::task::yield_now().await;
                    Err::<(), _>("boom")
                })
                .await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stats = cb.stats();
    assert_eq!(stats.state, CircuitState::Open);
    assert!(stats.failures >= 10);
}

// =========================================================================
// REGISTRY
// =========================================================================

#[tokio::test]
async fn test_registry() {
    let registry = CircuitBreakerRegistry::new();

    let cb1 = registry.get("component_a");
    let cb2 = registry.get("component_b");
    let cb1_again = registry.get("component_a");

    // Should return same instance
    assert!(Arc::ptr_eq(&cb1, &cb1_again));
    assert!(!Arc::ptr_eq(&cb1, &cb2));

    assert_eq!(registry.names(), vec!["component_a", "component_b"]);
    assert_eq!(registry.len(), 2);
    assert!(registry.lookup("component_c").is_none());
}

#[tokio::test]
async fn test_registry_first_config_wins() {
    let registry = CircuitBreakerRegistry::new();

    let first = registry.get_breaker("x", Some(quick_config(2, 1)));
    let second = registry.get_breaker("x", Some(quick_config(9, 9)));

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.config().failure_threshold, 2);
    assert_eq!(second.config().success_threshold, 1);
}

#[tokio::test(start_paused = true)]
async fn test_registry_accepts_zero_thresholds_from_call_site() {
    let registry = CircuitBreakerRegistry::new();
    let config = quick_config(0, 0);
    assert!(config.validate().is_err());

    let cb = registry.get_breaker("fx-rates", Some(config));
    assert_eq!(cb.config().failure_threshold, 0);

    let _ = fail(&cb).await;
    assert_eq!(cb.state(), CircuitState::Open);

    tokio::time::advance(Duration::from_millis(100)).await;
    assert_eq!(succeed(&cb).await.unwrap(), 7);
    assert_eq!(cb.state(), CircuitState::Closed);
}

#[tokio::test]
async fn test_registry_uses_default_config() {
    let registry = CircuitBreakerRegistry::with_config(CircuitBreakerConfig::lenient());
    let cb = registry.get_breaker("catalog", None);
    assert_eq!(cb.config(), &CircuitBreakerConfig::lenient());
}

#[tokio::test]
async fn test_registry_stats_and_reset_all() {
    let registry = CircuitBreakerRegistry::with_config(quick_config(1, 1));

    let _ = fail(&registry.get("payment-gateway")).await;
    let _ = succeed(&registry.get("catalog")).await;

    let stats = registry.all_stats();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats["payment-gateway"].state, CircuitState::Open);
    assert_eq!(stats["catalog"].state, CircuitState::Closed);
    assert!(stats["catalog"].last_success.is_some());

    registry.reset_all();
    for (name, stats) in registry.all_stats() {
        assert_eq!(stats.state, CircuitState::Closed, "{} not closed", name);
        assert!(stats.next_attempt.is_none());
    }
}

#[tokio::test(start_paused = true)]
async fn test_registry_maintenance() {
    let registry = CircuitBreakerRegistry::with_config(quick_config(5, 1));
    let _ = fail(&registry.get("stale")).await;

    tokio::time::advance(Duration::from_secs(8)).await;
    let _ = fail(&registry.get("fresh")).await;

    tokio::time::advance(Duration::from_secs(3)).await;
    assert_eq!(registry.run_maintenance(), 1);

    let stats = registry.all_stats();
    assert_eq!(stats["stale"].failures, 0);
    assert_eq!(stats["fresh"].failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_stats_report_serialization() {
    let registry = CircuitBreakerRegistry::with_config(quick_config(1, 1));
    let _ = fail(&registry.get("payment-gateway")).await;

    let report = registry.stats_report();
    let entry = &report["payment-gateway"];
    assert_eq!(entry.state, CircuitState::Open);
    assert!(entry.last_success_time.is_none());

    let last_failure = entry.last_failure_time.unwrap();
    let next_attempt = entry.next_attempt_time.unwrap();
    assert!(next_attempt > last_failure);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["payment-gateway"]["state"], "OPEN");
    assert_eq!(json["payment-gateway"]["failures"], 1);
    assert!(json["payment-gateway"]["last_success_time"].is_null());
}

#[test]
fn test_state_names() {
    assert_eq!(CircuitState::HalfOpen.to_string(), "HALF_OPEN");
    assert_eq!(
        serde_json::to_string(&CircuitState::HalfOpen).unwrap(),
        "\"HALF_OPEN\""
    );
}
