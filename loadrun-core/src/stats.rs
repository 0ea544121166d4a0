use crate::{Predicate, ThresholdMetric};
use std::fmt;
use std::time::Duration;

/// Aggregated transaction latency over a whole run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LatencySummary {
    pub avg: Duration,
    pub min: Duration,
    pub max: Duration,
    pub p50: Duration,
    pub p90: Duration,
    pub p95: Duration,
    pub p99: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckSummary {
    pub name: String,
    pub passes: u64,
    pub fails: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdOutcome {
    pub metric: ThresholdMetric,
    pub predicate: Predicate,
    /// `None` when the metric received no samples during the run.
    pub observed: Option<f64>,
    pub passed: bool,
}

/// Run Statistics for a given Scenario
#[derive(Clone, Debug, Default)]
pub struct RunStatistics {
    pub elapsed: Duration,
    pub iterations: u64,
    pub peak_vus: usize,
    pub success: u64,
    pub error: u64,
    pub error_rate: f64,
    pub latency: LatencySummary,
    pub checks: Vec<CheckSummary>,
    pub thresholds: Vec<ThresholdOutcome>,
}

impl RunStatistics {
    pub fn transactions(&self) -> u64 {
        self.success + self.error
    }

    pub fn passed(&self) -> bool {
        self.thresholds.iter().all(|t| t.passed)
    }

    pub fn failed_thresholds(&self) -> impl Iterator<Item = &ThresholdOutcome> {
        self.thresholds.iter().filter(|t| !t.passed)
    }

    pub fn check(&self, name: &str) -> Option<&CheckSummary> {
        self.checks.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "elapsed={} iterations={} peak_vus={}",
            humantime::format_duration(Duration::from_millis(self.elapsed.as_millis() as u64)),
            self.iterations,
            self.peak_vus
        )?;
        writeln!(
            f,
            "transactions={} failed={} ({:.2}%)",
            self.transactions(),
            self.error,
            self.error_rate * 100.
        )?;
        writeln!(
            f,
            "latency avg={:?} min={:?} max={:?} p50={:?} p90={:?} p95={:?} p99={:?}",
            self.latency.avg,
            self.latency.min,
            self.latency.max,
            self.latency.p50,
            self.latency.p90,
            self.latency.p95,
            self.latency.p99,
        )?;

        for check in &self.checks {
            let mark = if check.fails == 0 { "✓" } else { "✗" };
            writeln!(
                f,
                "  {mark} {} ({} passed, {} failed)",
                check.name, check.passes, check.fails
            )?;
        }

        for outcome in &self.thresholds {
            let mark = if outcome.passed { "✓" } else { "✗" };
            match outcome.observed {
                Some(observed) => writeln!(
                    f,
                    "  {mark} {}: {} (observed {observed:.4})",
                    outcome.metric, outcome.predicate
                )?,
                None => writeln!(
                    f,
                    "  {mark} {}: {} (no samples)",
                    outcome.metric, outcome.predicate
                )?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(passed: bool) -> ThresholdOutcome {
        ThresholdOutcome {
            metric: ThresholdMetric::HttpReqFailed,
            predicate: "rate<0.01".parse().unwrap(),
            observed: Some(0.5),
            passed,
        }
    }

    #[test]
    fn passes_only_when_every_threshold_holds() {
        let mut stats = RunStatistics::default();
        assert!(stats.passed());

        stats.thresholds = vec![outcome(true), outcome(false)];
        assert!(!stats.passed());
        assert_eq!(stats.failed_thresholds().count(), 1);
    }

    #[test]
    fn summary_lists_checks_and_thresholds() {
        let stats = RunStatistics {
            success: 9,
            error: 1,
            error_rate: 0.1,
            checks: vec![CheckSummary {
                name: "home status is 200".to_string(),
                passes: 9,
                fails: 1,
            }],
            thresholds: vec![outcome(false)],
            ..Default::default()
        };

        let summary = stats.to_string();
        assert!(summary.contains("transactions=10 failed=1 (10.00%)"));
        assert!(summary.contains("✗ home status is 200 (9 passed, 1 failed)"));
        assert!(summary.contains("✗ http_req_failed: rate<0.01 (observed 0.5000)"));
    }
}
