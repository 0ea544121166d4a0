use crate::measurement::Measurement;
use loadrun_core::{ThresholdOutcome, Thresholds};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Evaluate every threshold predicate against the final measurement.
///
/// A metric that received no samples cannot cross its threshold and is reported as passed.
pub(crate) fn evaluate(thresholds: &Thresholds, measurement: &Measurement) -> Vec<ThresholdOutcome> {
    thresholds
        .iter()
        .map(|entry| {
            let observed = measurement.observe(entry.metric, entry.predicate.aggregation);
            let passed = match observed {
                Some(value) => entry.predicate.holds(value),
                None => {
                    warn!(
                        "No samples for threshold {}: {}",
                        entry.metric, entry.predicate
                    );
                    true
                }
            };

            if !passed {
                error!(
                    "Threshold crossed: {}: {} (observed {:.4})",
                    entry.metric,
                    entry.predicate,
                    observed.unwrap_or_default()
                );
            }

            ThresholdOutcome {
                metric: entry.metric,
                predicate: entry.predicate.clone(),
                observed,
                passed,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::ProvisionalData;
    use loadrun_core::ThresholdMetric;
    use std::time::Duration;

    fn thresholds() -> Thresholds {
        Thresholds::new()
            .with(ThresholdMetric::HttpReqFailed, "rate<0.01")
            .unwrap()
            .with(ThresholdMetric::HttpReqDuration, "p(95)<200")
            .unwrap()
    }

    #[tracing_test::traced_test]
    #[test]
    fn no_samples_pass() {
        let outcomes = evaluate(&thresholds(), &Measurement::new());
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.passed && o.observed.is_none()));
        assert!(logs_contain("No samples for threshold"));
    }

    #[test]
    fn error_rate_crossed() {
        let mut measurement = Measurement::new();
        measurement.record(
            ProvisionalData {
                success: 95,
                error: 5,
                latency: vec![Duration::from_millis(20); 100],
                ..Default::default()
            },
            Duration::from_secs(1),
        );

        let outcomes = evaluate(&thresholds(), &measurement);
        assert!(!outcomes[0].passed);
        assert_eq!(outcomes[0].observed, Some(0.05));
        assert!(outcomes[1].passed);
    }
}
