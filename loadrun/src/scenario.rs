//! Scenario logic and configuration
use crate::sampler::Sampler;
use crate::thresholds;
use loadrun_core::{
    ConfigError, Executor, LoadProfile, RunStatistics, ScenarioConfig, Thresholds, PROGRESS_TICKS,
};
use std::{
    future::Future,
    num::NonZeroU32,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use tokio::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

/// What awaiting a [`Scenario`] yields.
pub type RunResult = Result<RunStatistics, ConfigError>;

/// Load test scenario structure
///
/// Handler for running scenarios. Not intended for manual creation, use the
/// [`#[scenario]`](loadrun_macros::scenario) macro which will add these methods to functions.
#[pin_project::pin_project]
pub struct Scenario<T> {
    func: T,
    runner_fut: Option<Pin<Box<dyn Future<Output = RunResult> + Send>>>,
    config: ScenarioConfig,
}

impl<T> Scenario<T> {
    #[doc(hidden)]
    pub fn new(name: &str, func: T) -> Self {
        Self {
            func,
            runner_fut: None,
            config: ScenarioConfig::new(name),
        }
    }
}

impl<T, F> Future for Scenario<T>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = ()> + Send + 'static,
{
    type Output = RunResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let runner = this.runner_fut.get_or_insert_with(|| {
            let func = this.func.clone();
            let config = this.config.clone();
            Box::pin(async move { run_scenario(func, config).await })
        });
        runner.as_mut().poll(cx)
    }
}

pub trait ConfigurableScenario<T: Send>: Future<Output = T> + Sized + Send {
    fn stages(self, profile: LoadProfile) -> Self;
    fn vus(self, vus: usize) -> Self;
    fn iterations(self, iterations: u64) -> Self;
    fn duration(self, duration: Duration) -> Self;
    fn thresholds(self, thresholds: Thresholds) -> Self;
    fn rps(self, rps: NonZeroU32) -> Self;
    fn graceful_stop(self, graceful_stop: Duration) -> Self;
}

impl<T, F> ConfigurableScenario<RunResult> for Scenario<T>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = ()> + Send + 'static,
{
    /// Ramp the number of VUs through the given stages. The run ends with the last stage.
    ///
    /// NOTE: Cannot be combined with `.vus()` or `.iterations()`
    ///
    /// # Example
    /// ```no_run
    /// use loadrun::prelude::*;
    /// use std::time::Duration;
    ///
    /// #[tokio::main(flavor = "current_thread")]
    /// async fn main() {
    ///     my_scenario()
    ///         .stages(vec![
    ///             Stage::new(Duration::from_secs(60), 50),
    ///             Stage::new(Duration::from_secs(180), 100),
    ///             Stage::new(Duration::from_secs(60), 0),
    ///         ].into())
    ///         .await
    ///         .unwrap();
    /// }
    ///
    /// #[scenario]
    /// async fn my_scenario() {
    /// }
    /// ```
    fn stages(mut self, profile: LoadProfile) -> Self {
        self.config.stages = Some(profile);
        self
    }

    /// Run a fixed number of VUs.
    ///
    /// NOTE: Must supply a `.duration()` or `.iterations()` as well
    fn vus(mut self, vus: usize) -> Self {
        self.config.vus = Some(vus);
        self
    }

    /// Share a total number of iterations between the VUs (one VU unless `.vus()` is given).
    ///
    /// # Example
    /// ```no_run
    /// use loadrun::prelude::*;
    ///
    /// #[tokio::main(flavor = "current_thread")]
    /// async fn main() {
    ///     let stats = my_scenario().vus(4).iterations(100).await.unwrap();
    ///     assert_eq!(stats.iterations, 100);
    /// }
    ///
    /// #[scenario]
    /// async fn my_scenario() {
    /// }
    /// ```
    fn iterations(mut self, iterations: u64) -> Self {
        self.config.iterations = Some(iterations);
        self
    }

    /// Run the scenario for at most the given duration. On its own, runs a single VU.
    fn duration(mut self, duration: Duration) -> Self {
        self.config.duration = Some(duration);
        self
    }

    /// Pass/fail conditions evaluated at the end of the run.
    fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    /// Cap the transaction rate across all VUs.
    fn rps(mut self, rps: NonZeroU32) -> Self {
        self.config.rps = Some(rps);
        self
    }

    /// How long in-flight iterations may run after the load is over before being aborted.
    fn graceful_stop(mut self, graceful_stop: Duration) -> Self {
        self.config.graceful_stop = graceful_stop;
        self
    }
}

#[instrument(name="scenario", skip_all, fields(name=config.name))]
pub(crate) async fn run_scenario<T, F>(scenario: T, config: ScenarioConfig) -> RunResult
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = ()> + Send + 'static,
{
    let executor = config.executor()?;
    info!("Running {} with {:?}", config.name, executor);

    let budget = match &executor {
        Executor::SharedIterations { iterations, .. } => Some(*iterations),
        _ => None,
    };

    let start = Instant::now();
    let mut sampler = Sampler::new(scenario, config.rps, budget).await;
    let mut ticks = 0u32;

    // NOTE: The VU target is recomputed once per sampling interval.
    loop {
        let elapsed = start.elapsed();

        let target = match &executor {
            Executor::RampingVus(profile) => profile.target_at(elapsed),
            Executor::ConstantVus { vus, duration } => (elapsed < *duration).then_some(*vus),
            Executor::SharedIterations {
                vus, max_duration, ..
            } => (elapsed < *max_duration).then_some(*vus),
        };

        let Some(target) = target else {
            break;
        };

        if config.duration.is_some_and(|d| elapsed >= d) {
            break;
        }

        if target != sampler.concurrency() {
            debug!("Setting VUs to {target}");
        }
        sampler.set_concurrency(target);

        if budget.is_some() && sampler.is_idle() {
            debug!("Iteration budget consumed.");
            break;
        }

        let measurement = sampler.sample().await;
        ticks += 1;
        if ticks % PROGRESS_TICKS == 0 {
            info!("VUs={target}, {measurement}");
        }
    }

    let peak_vus = sampler.peak_vus();
    let measurement = sampler.shutdown(config.graceful_stop).await;

    info!("Scenario complete: {measurement}");

    Ok(RunStatistics {
        elapsed: start.elapsed(),
        iterations: measurement.iterations,
        peak_vus,
        success: measurement.success,
        error: measurement.error,
        error_rate: measurement.error_rate(),
        latency: measurement.latency_summary(),
        checks: measurement.checks(),
        thresholds: thresholds::evaluate(&config.thresholds, &measurement),
    })
}
