//! The per-VU iteration and the full run.
use crate::client::{ApiClient, IterationState};
use crate::config::Cli;
use crate::journey::Journey;
use loadrun::prelude::*;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Everything an iteration needs, shared by all VUs.
pub struct IterationContext {
    pub client: ApiClient,
    pub journey: Journey,
    pub pacing: Duration,
    pub max_jitter: Duration,
}

impl IterationContext {
    pub fn new(client: ApiClient, cli: &Cli) -> Self {
        Self {
            client,
            journey: Journey {
                include_writes: cli.enable_writes,
            },
            pacing: *cli.pacing,
            max_jitter: *cli.max_jitter,
        }
    }
}

/// Outcome of one pass over the journey.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IterationReport {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[scenario]
pub async fn medicall_journey(ctx: Arc<IterationContext>) {
    let report = run_iteration(&ctx).await;
    trace!("Iteration finished: {report:?}");
}

/// Walk every step of the journey once, pacing between steps, then sleep a random jitter.
pub async fn run_iteration(ctx: &IterationContext) -> IterationReport {
    let mut state = IterationState::new(current_vu().unwrap_or(0));
    let mut report = IterationReport::default();

    for step in ctx.journey.steps() {
        match ctx.client.run_step(step, &mut state).await {
            Some(true) => report.passed += 1,
            Some(false) => report.failed += 1,
            None => {
                report.skipped += 1;
                continue;
            }
        }
        pause(ctx.pacing).await;
    }

    pause(jitter(ctx.max_jitter)).await;
    report
}

/// Uniform in `[0, max)`.
pub fn jitter(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    rand::thread_rng().gen_range(Duration::ZERO..max)
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        sleep(duration).await;
    }
}

/// Run the configured load against an already authenticated client.
pub async fn run(ctx: IterationContext, cli: &Cli) -> Result<RunStatistics, ConfigError> {
    info!(
        "Starting journey of {} steps against {}",
        ctx.journey.steps().count(),
        ctx.client.base_url()
    );
    cli.configure(medicall_journey(Arc::new(ctx)))?.await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_stays_below_max() {
        let max = Duration::from_secs(3);
        for _ in 0..1_000 {
            assert!(jitter(max) < max);
        }
    }

    #[test]
    fn zero_jitter() {
        assert_eq!(jitter(Duration::ZERO), Duration::ZERO);
    }
}
