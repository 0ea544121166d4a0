use loadrun_core::{Aggregation, CheckSummary, LatencySummary, ThresholdMetric};
use pdatastructs::tdigest::{TDigest, K1};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::error;

const TDIGEST_BACKLOG_SIZE: usize = 100;

/// Counters drained from the task atomics over one sampling interval.
#[derive(Debug, Default)]
pub(crate) struct ProvisionalData {
    pub success: u64,
    pub error: u64,
    pub iterations: u64,
    pub latency: Vec<Duration>,
    pub checks: Vec<(&'static str, bool)>,
}

/// Cumulative measurements over the whole run.
#[derive(Debug, Clone)]
pub(crate) struct Measurement {
    pub success: u64,
    pub error: u64,
    pub iterations: u64,
    pub elapsed: Duration,
    latency: TDigest<K1>,
    latency_count: u64,
    latency_sum: Duration,
    latency_min: Duration,
    latency_max: Duration,
    checks: BTreeMap<&'static str, (u64, u64)>,
}

impl Measurement {
    pub fn new() -> Self {
        Self {
            success: 0,
            error: 0,
            iterations: 0,
            elapsed: Duration::ZERO,
            latency: default_tdigest(),
            latency_count: 0,
            latency_sum: Duration::ZERO,
            latency_min: Duration::MAX,
            latency_max: Duration::ZERO,
            checks: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, data: ProvisionalData, elapsed: Duration) {
        self.success += data.success;
        self.error += data.error;
        self.iterations += data.iterations;
        self.elapsed += elapsed;

        for latency in data.latency {
            self.latency.insert(latency.as_secs_f64());
            self.latency_count += 1;
            self.latency_sum += latency;
            self.latency_min = self.latency_min.min(latency);
            self.latency_max = self.latency_max.max(latency);
        }

        for (name, passed) in data.checks {
            let entry = self.checks.entry(name).or_default();
            if passed {
                entry.0 += 1;
            } else {
                entry.1 += 1;
            }
        }
    }

    pub fn transactions(&self) -> u64 {
        self.success + self.error
    }

    pub fn error_rate(&self) -> f64 {
        if self.transactions() == 0 {
            0.
        } else {
            self.error as f64 / self.transactions() as f64
        }
    }

    pub fn latency(&self, quantile: f64) -> Option<Duration> {
        if self.latency_count == 0 {
            return None;
        }

        let secs = self.latency.quantile(quantile);

        // TDigest can hand back NaN on tiny sample sets.
        let secs = if secs.is_finite() {
            secs.max(0.)
        } else {
            error!("NaN latency calculation for quantile {quantile}.");
            0.
        };

        Some(Duration::from_secs_f64(secs))
    }

    pub fn latency_summary(&self) -> LatencySummary {
        if self.latency_count == 0 {
            return LatencySummary::default();
        }

        LatencySummary {
            avg: self.latency_sum / self.latency_count as u32,
            min: self.latency_min,
            max: self.latency_max,
            p50: self.latency(0.5).unwrap_or_default(),
            p90: self.latency(0.9).unwrap_or_default(),
            p95: self.latency(0.95).unwrap_or_default(),
            p99: self.latency(0.99).unwrap_or_default(),
        }
    }

    pub fn checks(&self) -> Vec<CheckSummary> {
        self.checks
            .iter()
            .map(|(name, (passes, fails))| CheckSummary {
                name: name.to_string(),
                passes: *passes,
                fails: *fails,
            })
            .collect()
    }

    /// The value a threshold on `metric` is compared against. Durations are in milliseconds.
    pub fn observe(&self, metric: ThresholdMetric, aggregation: Aggregation) -> Option<f64> {
        use Aggregation::*;

        match (metric, aggregation) {
            (ThresholdMetric::HttpReqFailed, Rate) => {
                (self.transactions() > 0).then(|| self.error_rate())
            }
            (ThresholdMetric::Checks, Rate) => {
                let (passes, fails) = self
                    .checks
                    .values()
                    .fold((0, 0), |acc, (p, f)| (acc.0 + p, acc.1 + f));
                (passes + fails > 0).then(|| passes as f64 / (passes + fails) as f64)
            }
            (ThresholdMetric::Iterations, Count) => Some(self.iterations as f64),
            (ThresholdMetric::Iterations, Rate) => {
                (!self.elapsed.is_zero()).then(|| self.iterations as f64 / self.elapsed.as_secs_f64())
            }
            (ThresholdMetric::HttpReqDuration, Avg) => (self.latency_count > 0)
                .then(|| millis(self.latency_sum) / self.latency_count as f64),
            (ThresholdMetric::HttpReqDuration, Min) => {
                (self.latency_count > 0).then(|| millis(self.latency_min))
            }
            (ThresholdMetric::HttpReqDuration, Max) => {
                (self.latency_count > 0).then(|| millis(self.latency_max))
            }
            (ThresholdMetric::HttpReqDuration, Med) => self.latency(0.5).map(millis),
            (ThresholdMetric::HttpReqDuration, Percentile(p)) => self.latency(p / 100.).map(millis),
            _ => None,
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tps = if self.elapsed.is_zero() {
            0.
        } else {
            self.transactions() as f64 / self.elapsed.as_secs_f64()
        };
        write!(
            f,
            "TPS={:.2}, ErrorRate={:.4}, Iterations={}, p50={:?}, p95={:?}",
            tps,
            self.error_rate(),
            self.iterations,
            self.latency(0.5).unwrap_or_default(),
            self.latency(0.95).unwrap_or_default(),
        )
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1_000.
}

fn default_tdigest() -> TDigest<K1> {
    TDigest::new(K1::new(10.), TDIGEST_BACKLOG_SIZE)
}
