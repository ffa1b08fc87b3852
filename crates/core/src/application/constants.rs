// Scheduler and job constants (no magic values)
use std::time::Duration;

/// Default interval between scheduling passes (rules have minute granularity)
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Shortest accepted tick interval (tokio intervals panic on zero)
pub const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Customers without an order inside this window are purged
pub const INACTIVITY_WINDOW_DAYS: i64 = 365;

/// Heartbeat keeps only the head of a probe error
pub const HEARTBEAT_ERROR_MAX_CHARS: usize = 100;

/// Default deadline for in-flight executions on shutdown
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// A late pass still dispatches rules that matched within this many minutes
/// since the previous pass. Older matches are dropped.
pub const MAX_CATCH_UP_MINUTES: i64 = 24 * 60;
