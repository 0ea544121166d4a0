use std::time::Duration;

/// Interval at which the VU target is re-evaluated and task counters are collected.
pub const BASE_INTERVAL: Duration = Duration::from_millis(200);

/// Number of `BASE_INTERVAL` ticks between progress log lines.
pub const PROGRESS_TICKS: u32 = 25;

/// Time given to running iterations to finish once the run is over.
pub const DEFAULT_GRACEFUL_STOP: Duration = Duration::from_secs(30);

/// Upper bound on a shared-iterations run when no `.duration()` is supplied.
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(10 * 60);
