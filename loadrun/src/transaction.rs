use arc_swap::ArcSwapOption;
use governor::DefaultDirectRateLimiter;
use loadrun_core::TransactionLabels;
use metrics_util::AtomicBucket;
use std::future::Future;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;
use tokio::time::Instant;

/// Transaction hook used by the `#[transaction]` macro. Not intended to be used manually.
pub async fn transaction_hook<T, R, E>(labels: TransactionLabels, func: T) -> T::Output
where
    T: Future<Output = Result<R, E>>,
{
    if let Ok(hook) = TRANSACTION_HOOK.try_with(|v| v.clone()) {
        if let Some(limiter) = hook.limiter.load_full() {
            limiter.until_ready().await;
        }

        let start = Instant::now();
        let res = func.await;
        let elapsed = start.elapsed();

        hook.latency.push(elapsed);

        #[cfg(feature = "metrics")]
        metrics::histogram!(labels.latency).record(elapsed.as_secs_f64());

        if res.is_ok() {
            hook.success.fetch_add(1, Ordering::Relaxed);
            #[cfg(feature = "metrics")]
            metrics::counter!(labels.success).increment(1);
        } else {
            hook.error.fetch_add(1, Ordering::Relaxed);
            #[cfg(feature = "metrics")]
            metrics::counter!(labels.error).increment(1);
        }

        res
    } else {
        tracing::debug!("No hook available for transaction {}.", labels.name);
        func.await
    }
}

/// Record the outcome of a named check and return it.
///
/// Failed checks are counted towards the `checks` threshold metric; they never stop the
/// iteration.
///
/// # Example
/// ```ignore
/// let ok = loadrun::check("status is 200", res.status() == 200);
/// ```
pub fn check(name: &'static str, passed: bool) -> bool {
    if TRANSACTION_HOOK
        .try_with(|hook| hook.checks.push((name, passed)))
        .is_err()
    {
        tracing::debug!("No hook available for check {name}.");
    }

    #[cfg(feature = "metrics")]
    metrics::counter!(
        loadrun_core::CHECKS_METRIC,
        "check" => name,
        "result" => if passed { "pass" } else { "fail" }
    )
    .increment(1);

    passed
}

/// 1-based index of the VU running the current task, if any.
pub fn current_vu() -> Option<usize> {
    TRANSACTION_HOOK.try_with(|hook| hook.vu).ok()
}

#[derive(Clone)]
pub(crate) struct TransactionData {
    pub vu: usize,
    pub limiter: Arc<ArcSwapOption<DefaultDirectRateLimiter>>,
    pub success: Arc<AtomicU64>,
    pub error: Arc<AtomicU64>,
    pub latency: Arc<AtomicBucket<Duration>>,
    pub checks: Arc<AtomicBucket<(&'static str, bool)>>,
}

tokio::task_local! {
    pub(crate) static TRANSACTION_HOOK: TransactionData;
}
