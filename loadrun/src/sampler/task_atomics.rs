use crate::measurement::ProvisionalData;
use crate::transaction::TransactionData;
use arc_swap::ArcSwapOption;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use metrics_util::AtomicBucket;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counters shared by every VU task of a run.
pub(crate) struct TaskAtomics {
    limiter: Arc<ArcSwapOption<DefaultDirectRateLimiter>>,
    success: Arc<AtomicU64>,
    error: Arc<AtomicU64>,
    iterations: Arc<AtomicU64>,
    latency: Arc<AtomicBucket<Duration>>,
    checks: Arc<AtomicBucket<(&'static str, bool)>>,
}

impl TaskAtomics {
    pub fn new(rps: Option<NonZeroU32>) -> Self {
        Self {
            limiter: Arc::new(ArcSwapOption::new(rps.map(|rps| Arc::new(rate_limiter(rps))))),
            success: Arc::new(AtomicU64::new(0)),
            error: Arc::new(AtomicU64::new(0)),
            iterations: Arc::new(AtomicU64::new(0)),
            latency: Arc::new(AtomicBucket::new()),
            checks: Arc::new(AtomicBucket::new()),
        }
    }

    pub fn iteration_counter(&self) -> Arc<AtomicU64> {
        self.iterations.clone()
    }

    pub fn clone_to_transaction_data(&self, vu: usize) -> TransactionData {
        TransactionData {
            vu,
            limiter: self.limiter.clone(),
            success: self.success.clone(),
            error: self.error.clone(),
            latency: self.latency.clone(),
            checks: self.checks.clone(),
        }
    }

    pub fn collect(&self) -> ProvisionalData {
        let mut data = ProvisionalData {
            success: self.success.swap(0, Ordering::Relaxed),
            error: self.error.swap(0, Ordering::Relaxed),
            iterations: self.iterations.swap(0, Ordering::Relaxed),
            ..Default::default()
        };
        self.latency
            .clear_with(|dur| data.latency.extend_from_slice(dur));
        self.checks
            .clear_with(|checks| data.checks.extend_from_slice(checks));
        data
    }
}

fn rate_limiter(rps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(rps).allow_burst(NonZeroU32::MIN))
}
