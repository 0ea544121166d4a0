use crate::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Metrics a threshold can be placed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ThresholdMetric {
    /// Rate of failed transactions.
    HttpReqFailed,
    /// Transaction latency in milliseconds.
    HttpReqDuration,
    /// Rate of passed checks.
    Checks,
    /// Completed iterations.
    Iterations,
}

impl ThresholdMetric {
    pub fn name(&self) -> &'static str {
        match self {
            Self::HttpReqFailed => "http_req_failed",
            Self::HttpReqDuration => "http_req_duration",
            Self::Checks => "checks",
            Self::Iterations => "iterations",
        }
    }

    pub fn supports(&self, aggregation: Aggregation) -> bool {
        use Aggregation::*;
        match self {
            Self::HttpReqFailed | Self::Checks => matches!(aggregation, Rate),
            Self::HttpReqDuration => matches!(aggregation, Avg | Min | Max | Med | Percentile(_)),
            Self::Iterations => matches!(aggregation, Count | Rate),
        }
    }
}

impl FromStr for ThresholdMetric {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "http_req_failed" => Ok(Self::HttpReqFailed),
            "http_req_duration" => Ok(Self::HttpReqDuration),
            "checks" => Ok(Self::Checks),
            "iterations" => Ok(Self::Iterations),
            other => Err(ConfigError::UnknownMetric(other.to_string())),
        }
    }
}

impl fmt::Display for ThresholdMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Aggregation {
    Rate,
    Count,
    Avg,
    Min,
    Max,
    Med,
    /// Percentile in `0..=100`.
    Percentile(f64),
}

impl FromStr for Aggregation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let aggregation = match s {
            "rate" => Self::Rate,
            "count" => Self::Count,
            "avg" => Self::Avg,
            "min" => Self::Min,
            "max" => Self::Max,
            "med" => Self::Med,
            _ => {
                let p = s
                    .strip_prefix("p(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .and_then(|p| p.trim().parse::<f64>().ok())
                    .filter(|p| (0. ..=100.).contains(p))
                    .ok_or_else(|| ConfigError::InvalidThreshold(s.to_string()))?;
                Self::Percentile(p)
            }
        };
        Ok(aggregation)
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rate => f.write_str("rate"),
            Self::Count => f.write_str("count"),
            Self::Avg => f.write_str("avg"),
            Self::Min => f.write_str("min"),
            Self::Max => f.write_str("max"),
            Self::Med => f.write_str("med"),
            Self::Percentile(p) => write!(f, "p({p})"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Comparison {
    // Two-character operators first so `<=` is not read as `<`.
    const OPERATORS: [(&'static str, Comparison); 6] = [
        ("<=", Comparison::Le),
        (">=", Comparison::Ge),
        ("==", Comparison::Eq),
        ("!=", Comparison::Ne),
        ("<", Comparison::Lt),
        (">", Comparison::Gt),
    ];

    pub fn apply(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
        }
    }

    fn symbol(&self) -> &'static str {
        Self::OPERATORS
            .iter()
            .find(|(_, c)| c == self)
            .map(|(s, _)| *s)
            .unwrap_or("?")
    }
}

/// A single `aggregation op value` expression, e.g. `p(95)<200` or `rate<0.01`.
#[derive(Clone, Debug, PartialEq)]
pub struct Predicate {
    pub aggregation: Aggregation,
    pub comparison: Comparison,
    pub value: f64,
}

impl Predicate {
    pub fn holds(&self, observed: f64) -> bool {
        self.comparison.apply(observed, self.value)
    }
}

impl FromStr for Predicate {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidThreshold(s.to_string());

        let op_start = s.find(['<', '>', '=', '!']).ok_or_else(invalid)?;
        let (lhs, rest) = s.split_at(op_start);
        let (symbol, comparison) = Comparison::OPERATORS
            .iter()
            .find(|(symbol, _)| rest.starts_with(symbol))
            .copied()
            .ok_or_else(invalid)?;

        let aggregation = lhs.parse::<Aggregation>().map_err(|_| invalid())?;
        let value = rest[symbol.len()..]
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid())?;

        Ok(Self {
            aggregation,
            comparison,
            value,
        })
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.aggregation,
            self.comparison.symbol(),
            self.value
        )
    }
}

/// A `metric=expression` pair, e.g. `http_req_duration=p(95)<200`.
#[derive(Clone, Debug, PartialEq)]
pub struct ThresholdEntry {
    pub metric: ThresholdMetric,
    pub predicate: Predicate,
}

impl ThresholdEntry {
    pub fn new(metric: ThresholdMetric, expression: &str) -> Result<Self, ConfigError> {
        let predicate: Predicate = expression.parse()?;
        if !metric.supports(predicate.aggregation) {
            return Err(ConfigError::UnsupportedAggregation {
                metric: metric.name(),
                aggregation: predicate.aggregation.to_string(),
            });
        }
        Ok(Self { metric, predicate })
    }
}

impl FromStr for ThresholdEntry {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (metric, expression) = s
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidThreshold(s.to_string()))?;
        Self::new(metric.parse()?, expression)
    }
}

/// Pass/fail conditions evaluated against the aggregated metrics at the end of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Thresholds {
    entries: Vec<ThresholdEntry>,
}

impl Thresholds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate on `metric`.
    ///
    /// # Example
    /// ```
    /// use loadrun_core::{Thresholds, ThresholdMetric};
    ///
    /// let thresholds = Thresholds::new()
    ///     .with(ThresholdMetric::HttpReqFailed, "rate<0.01")?
    ///     .with(ThresholdMetric::HttpReqDuration, "p(95)<200")?;
    /// assert_eq!(thresholds.len(), 2);
    /// # Ok::<(), loadrun_core::ConfigError>(())
    /// ```
    pub fn with(mut self, metric: ThresholdMetric, expression: &str) -> Result<Self, ConfigError> {
        self.push(ThresholdEntry::new(metric, expression)?);
        Ok(self)
    }

    pub fn push(&mut self, entry: ThresholdEntry) {
        self.entries.push(entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ThresholdEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<ThresholdEntry> for Thresholds {
    fn from_iter<I: IntoIterator<Item = ThresholdEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
