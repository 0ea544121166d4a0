mod task_atomics;
mod timer;
mod vu_pool;

use crate::measurement::Measurement;
use loadrun_core::BASE_INTERVAL;
use std::future::Future;
use std::num::NonZeroU32;
use std::time::Duration;
use task_atomics::TaskAtomics;
use timer::Timer;
use vu_pool::VuPool;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Drives a VU pool and folds what the VUs record into a cumulative [`Measurement`].
pub(crate) struct Sampler<T> {
    pool: VuPool<T>,
    task_atomics: TaskAtomics,
    timer: Timer,
    measurement: Measurement,
    peak_vus: usize,
}

impl<T, F> Sampler<T>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = ()> + Send + 'static,
{
    pub async fn new(scenario: T, rps: Option<NonZeroU32>, budget: Option<u64>) -> Self {
        let timer = Timer::new(BASE_INTERVAL).await;
        debug!("Sampling every {timer}");

        Self {
            pool: VuPool::new(scenario, budget),
            task_atomics: TaskAtomics::new(rps),
            timer,
            measurement: Measurement::new(),
            peak_vus: 0,
        }
    }

    pub fn set_concurrency(&mut self, concurrency: usize) {
        self.pool.set_concurrency(concurrency, &self.task_atomics);
        self.peak_vus = self.peak_vus.max(concurrency);

        #[cfg(feature = "metrics")]
        metrics::gauge!(loadrun_core::VUS_METRIC).set(concurrency as f64);
    }

    pub fn concurrency(&self) -> usize {
        self.pool.concurrency()
    }

    pub fn peak_vus(&self) -> usize {
        self.peak_vus
    }

    pub fn is_idle(&self) -> bool {
        self.pool.is_idle()
    }

    /// Wait one sampling interval and collect what the VUs recorded during it.
    pub async fn sample(&mut self) -> &Measurement {
        let elapsed = self.timer.tick().await;
        self.measurement
            .record(self.task_atomics.collect(), elapsed);
        &self.measurement
    }

    /// Stop all VUs and return the final measurement.
    pub async fn shutdown(self, graceful_stop: Duration) -> Measurement {
        let Self {
            pool,
            task_atomics,
            timer,
            mut measurement,
            ..
        } = self;

        pool.shutdown(graceful_stop).await;

        #[cfg(feature = "metrics")]
        metrics::gauge!(loadrun_core::VUS_METRIC).set(0.);

        measurement.record(task_atomics.collect(), timer.since_last_tick());
        measurement
    }
}
