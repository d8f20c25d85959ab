//! Default policy values and environment variable names

/// Failures in the closed state before a breaker opens
pub const FAILURE_THRESHOLD: u32 = 5;

/// Time a breaker stays open before a probe is allowed (60 seconds)
pub const RECOVERY_TIMEOUT_MS: u64 = 60_000;

/// Age after which idle counters are cleared by maintenance (5 minutes)
pub const MONITORING_PERIOD_MS: u64 = 300_000;

/// Half-open probe successes needed to close a breaker
pub const SUCCESS_THRESHOLD: u32 = 3;

/// Interval between maintenance runs (60 seconds)
pub const MAINTENANCE_INTERVAL_MS: u64 = 60_000;

/// Master switch; only the exact value `false` disables protection
pub const ENABLED_ENV_VAR: &str = "CIRCUIT_BREAKER_ENABLED";

/// Prefix for settings overrides taken from the environment
pub const ENV_PREFIX: &str = "TRIPWIRE_";
