use crate::ConfigError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A time-boxed target VU level.
///
/// Parses from `DURATION:TARGET`, e.g. `1m:50` or `90s:100`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stage {
    pub duration: Duration,
    pub target: usize,
}

impl Stage {
    pub fn new(duration: Duration, target: usize) -> Self {
        Self { duration, target }
    }
}

impl FromStr for Stage {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidStage(s.to_string());

        let (duration, target) = s.split_once(':').ok_or_else(invalid)?;
        let duration = humantime::parse_duration(duration.trim()).map_err(|_| invalid())?;
        let target = target.trim().parse::<usize>().map_err(|_| invalid())?;

        Ok(Self { duration, target })
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            humantime::format_duration(self.duration),
            self.target
        )
    }
}

/// Ordered list of stages. The VU count starts at 0 and moves linearly from one stage target to
/// the next over each stage's duration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadProfile {
    stages: Vec<Stage>,
}

impl LoadProfile {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    pub fn peak(&self) -> usize {
        self.stages.iter().map(|s| s.target).max().unwrap_or(0)
    }

    /// VU target at `elapsed` since the start of the run, or `None` once every stage is over.
    pub fn target_at(&self, elapsed: Duration) -> Option<usize> {
        let mut from = 0;
        let mut start = Duration::ZERO;

        for stage in &self.stages {
            let end = start + stage.duration;
            if elapsed < end {
                let progress = (elapsed - start).as_secs_f64() / stage.duration.as_secs_f64();
                let vus = from as f64 + (stage.target as f64 - from as f64) * progress;
                return Some(vus.round() as usize);
            }
            from = stage.target;
            start = end;
        }

        None
    }
}

impl From<Vec<Stage>> for LoadProfile {
    fn from(stages: Vec<Stage>) -> Self {
        Self::new(stages)
    }
}

impl fmt::Display for LoadProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages: Vec<_> = self.stages.iter().map(|s| s.to_string()).collect();
        write!(f, "[{}]", stages.join(", "))
    }
}
