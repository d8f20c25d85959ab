//! Scripted failure simulation against a fake downstream

use anyhow::{Context, Result, bail};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tripwire_core::{
    CircuitBreakerError, CircuitBreakerMiddleware, CircuitBreakerRegistry, ResilienceSettings,
    spawn_maintenance,
};

use crate::console::CliConsole;

/// Options for the `simulate` command
pub struct SimulateOptions {
    pub service: String,
    pub pattern: String,
    pub delay_ms: u64,
    pub maintenance: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    Failure,
}

/// Error returned by the fake downstream
#[derive(Debug)]
struct DownstreamError {
    call: usize,
}

impl fmt::Display for DownstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "downstream failure on call {}", self.call)
    }
}

impl std::error::Error for DownstreamError {}

fn parse_pattern(pattern: &str) -> Result<Vec<Outcome>> {
    let outcomes = pattern
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c.to_ascii_lowercase() {
            's' => Ok(Outcome::Success),
            'f' => Ok(Outcome::Failure),
            other => bail!("invalid outcome '{}' in pattern (expected 's' or 'f')", other),
        })
        .collect::<Result<Vec<_>>>()?;

    if outcomes.is_empty() {
        bail!("pattern must contain at least one outcome");
    }
    Ok(outcomes)
}

async fn downstream(call: usize, outcome: Outcome) -> Result<usize, DownstreamError> {
    match outcome {
        Outcome::Success => Ok(call),
        Outcome::Failure => Err(DownstreamError { call }),
    }
}

/// Run the simulation and print the final stats as JSON
pub async fn run(settings: &ResilienceSettings, options: SimulateOptions) -> Result<()> {
    let console = CliConsole::new(options.verbose);
    let outcomes = parse_pattern(&options.pattern)?;

    let registry = Arc::new(CircuitBreakerRegistry::with_config(settings.defaults.clone()));
    let middleware = CircuitBreakerMiddleware::from_settings(registry.clone(), settings);

    let cancel_token = CancellationToken::new();
    let maintenance = options.maintenance.then(|| {
        tracing::debug!(
            interval_ms = settings.maintenance_interval.as_millis() as u64,
            "Starting registry maintenance for simulation"
        );
        spawn_maintenance(
            registry.clone(),
            settings.maintenance_interval,
            cancel_token.clone(),
        )
    });

    console.print_header(&format!(
        "Simulating {} calls to '{}'",
        outcomes.len(),
        options.service
    ));
    if !middleware.is_enabled() {
        console.warn("Circuit breaker protection is disabled; every call reaches the downstream");
    }

    for (index, outcome) in outcomes.into_iter().enumerate() {
        let call = index + 1;
        let result = middleware
            .execute_with_breaker(&options.service, || downstream(call, outcome), None)
            .await;

        let state = registry
            .lookup(&options.service)
            .map(|breaker| breaker.state().to_string())
            .unwrap_or_else(|| "-".to_string());

        match result {
            Ok(_) => console.success(&format!("#{:<3} ok       [{}]", call, state)),
            Err(CircuitBreakerError::Operation(e)) => {
                console.warn(&format!("#{:<3} failed   [{}] {}", call, state, e))
            }
            Err(CircuitBreakerError::Open(e)) => {
                let retry = e
                    .retry_after
                    .map(|d| format!(" (retry in {}ms)", d.as_millis()))
                    .unwrap_or_default();
                console.error(&format!("#{:<3} rejected [{}] {}{}", call, state, e, retry))
            }
        }

        if options.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(options.delay_ms)).await;
        }
    }

    cancel_token.cancel();
    if let Some(handle) = maintenance {
        handle.await.context("Maintenance task panicked")?;
        tracing::debug!("Registry maintenance stopped");
    }

    println!("{}", render_report(&registry)?);
    Ok(())
}

/// Final stats for every breaker as pretty-printed JSON
fn render_report(registry: &CircuitBreakerRegistry) -> Result<String> {
    serde_json::to_string_pretty(&registry.stats_report()).context("Failed to serialize stats")
}
