//! Periodic registry maintenance
//!
//! Nothing runs in the background unless the application spawns this task
//! itself; [`CircuitBreakerRegistry::run_maintenance`] can equally be driven
//! from an existing scheduler.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

use super::circuit_breaker::CircuitBreakerRegistry;

/// Spawn a task that runs registry maintenance every `period`
///
/// The task stops when `cancel_token` is cancelled.
pub fn spawn_maintenance(
    registry: Arc<CircuitBreakerRegistry>,
    period: Duration,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        tracing::debug!(period_ms = period.as_millis() as u64, "Maintenance task started");

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    tracing::debug!("Maintenance task stopped");
                    break;
                }
                _ = ticker.tick() => {
                    registry.run_maintenance();
                }
            }
        }
    })
}
