use crate::sampler::task_atomics::TaskAtomics;
use crate::transaction::TRANSACTION_HOOK;
use std::future::Future;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::task::JoinHandle;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

struct Vu {
    handle: JoinHandle<()>,
    stop: Arc<AtomicBool>,
}

impl Vu {
    fn retire(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// One tokio task per VU, each calling the scenario in a loop.
///
/// Lowering the concurrency retires VUs: they finish the iteration in flight and exit.
pub(crate) struct VuPool<T> {
    scenario: T,
    active: Vec<Vu>,
    retiring: Vec<Vu>,
    budget: Option<Arc<AtomicU64>>,
    spawned: usize,
}

impl<T, F> VuPool<T>
where
    T: Fn() -> F + Send + Sync + 'static + Clone,
    F: Future<Output = ()> + Send + 'static,
{
    /// `budget` caps the total number of iterations started across all VUs.
    pub fn new(scenario: T, budget: Option<u64>) -> Self {
        Self {
            scenario,
            active: vec![],
            retiring: vec![],
            budget: budget.map(|b| Arc::new(AtomicU64::new(b))),
            spawned: 0,
        }
    }

    pub fn set_concurrency(&mut self, concurrency: usize, atomics: &TaskAtomics) {
        self.retiring.retain(|vu| !vu.handle.is_finished());

        if self.active.len() == concurrency {
            return;
        }

        if self.active.len() > concurrency {
            for vu in self.active.drain(concurrency..) {
                vu.retire();
                self.retiring.push(vu);
            }
        } else {
            while self.active.len() < concurrency {
                let vu = self.spawn(atomics);
                self.active.push(vu);
            }
        }

        trace!(
            "VUs: {} active, {} retiring",
            self.active.len(),
            self.retiring.len()
        );
    }

    fn spawn(&mut self, atomics: &TaskAtomics) -> Vu {
        self.spawned += 1;

        let scenario = self.scenario.clone();
        let transaction_data = atomics.clone_to_transaction_data(self.spawned);
        let iterations = atomics.iteration_counter();
        let budget = self.budget.clone();
        let stop = Arc::new(AtomicBool::new(false));
        let task_stop = stop.clone();

        let handle = tokio::spawn(TRANSACTION_HOOK.scope(transaction_data, async move {
            while !task_stop.load(Ordering::Relaxed) {
                if let Some(budget) = &budget {
                    if budget
                        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
                        .is_err()
                    {
                        break;
                    }
                }

                scenario().await;
                iterations.fetch_add(1, Ordering::Relaxed);

                #[cfg(feature = "metrics")]
                metrics::counter!(loadrun_core::ITERATIONS_METRIC).increment(1);
            }
        }));

        Vu { handle, stop }
    }

    /// Number of VUs currently scheduled to run.
    pub fn concurrency(&self) -> usize {
        self.active.len()
    }

    /// True once every VU task has exited on its own, e.g. after the iteration budget ran out.
    pub fn is_idle(&self) -> bool {
        self.active
            .iter()
            .chain(self.retiring.iter())
            .all(|vu| vu.handle.is_finished())
    }

    /// Stop every VU, give in-flight iterations `graceful_stop` to complete and abort the rest.
    pub async fn shutdown(mut self, graceful_stop: Duration) {
        let mut vus: Vec<Vu> = self.active.drain(..).chain(self.retiring.drain(..)).collect();
        vus.iter().for_each(Vu::retire);

        let drained = tokio::time::timeout(graceful_stop, async {
            for vu in vus.iter_mut() {
                if let Err(err) = (&mut vu.handle).await {
                    if err.is_panic() {
                        error!("VU task panicked: {err}");
                    }
                }
            }
        })
        .await;

        if drained.is_err() {
            let remaining = vus.iter().filter(|vu| !vu.handle.is_finished()).count();
            warn!("Aborting {remaining} VUs still running after the graceful stop period.");
            for vu in vus {
                vu.handle.abort();
            }
        }
    }
}
