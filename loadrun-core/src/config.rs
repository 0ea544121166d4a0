use crate::{LoadProfile, Thresholds, DEFAULT_GRACEFUL_STOP, DEFAULT_MAX_DURATION};
use std::num::NonZeroU32;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid stage `{0}`; expected DURATION:TARGET such as `1m:50`")]
    InvalidStage(String),

    #[error("Invalid threshold expression `{0}`")]
    InvalidThreshold(String),

    #[error("Unknown threshold metric `{0}`")]
    UnknownMetric(String),

    #[error("Aggregation `{aggregation}` is not available on `{metric}`")]
    UnsupportedAggregation {
        metric: &'static str,
        aggregation: String,
    },

    #[error("No load configured; supply stages, vus, iterations or a duration")]
    NoLoad,

    #[error("Stages cannot be combined with vus or iterations")]
    ConflictingExecutors,

    #[error("A constant-VU run needs a duration")]
    MissingDuration,

    #[error("At least one VU is required")]
    ZeroVus,
}

/// How VUs are scheduled over the course of a run.
#[derive(Clone, Debug, PartialEq)]
pub enum Executor {
    /// VU count follows the stages of the profile.
    RampingVus(LoadProfile),
    /// A fixed number of VUs for a fixed duration.
    ConstantVus { vus: usize, duration: Duration },
    /// A fixed number of VUs sharing a total iteration budget.
    SharedIterations {
        vus: usize,
        iterations: u64,
        max_duration: Duration,
    },
}

#[doc(hidden)]
#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    pub name: String,
    pub stages: Option<LoadProfile>,
    pub vus: Option<usize>,
    pub iterations: Option<u64>,
    pub duration: Option<Duration>,
    pub thresholds: Thresholds,
    pub rps: Option<NonZeroU32>,
    pub graceful_stop: Duration,
}

impl ScenarioConfig {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            stages: None,
            vus: None,
            iterations: None,
            duration: None,
            thresholds: Thresholds::new(),
            rps: None,
            graceful_stop: DEFAULT_GRACEFUL_STOP,
        }
    }

    pub fn executor(&self) -> Result<Executor, ConfigError> {
        match self {
            ScenarioConfig {
                stages: Some(_),
                vus: Some(_),
                ..
            }
            | ScenarioConfig {
                stages: Some(_),
                iterations: Some(_),
                ..
            } => Err(ConfigError::ConflictingExecutors),

            ScenarioConfig {
                stages: Some(profile),
                ..
            } if profile.is_empty() => Err(ConfigError::NoLoad),

            ScenarioConfig {
                stages: Some(profile),
                ..
            } => Ok(Executor::RampingVus(profile.clone())),

            ScenarioConfig { vus: Some(0), .. } => Err(ConfigError::ZeroVus),

            ScenarioConfig {
                iterations: Some(iterations),
                vus,
                duration,
                ..
            } => Ok(Executor::SharedIterations {
                vus: vus.unwrap_or(1),
                iterations: *iterations,
                max_duration: duration.unwrap_or(DEFAULT_MAX_DURATION),
            }),

            ScenarioConfig {
                vus,
                duration: Some(duration),
                ..
            } => Ok(Executor::ConstantVus {
                vus: vus.unwrap_or(1),
                duration: *duration,
            }),

            ScenarioConfig { vus: Some(_), .. } => Err(ConfigError::MissingDuration),

            _ => Err(ConfigError::NoLoad),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Stage;

    #[test]
    fn stages_select_ramping() {
        let mut config = ScenarioConfig::new("test");
        config.stages = Some(vec![Stage::new(Duration::from_secs(1), 5)].into());
        assert!(matches!(config.executor(), Ok(Executor::RampingVus(_))));

        config.vus = Some(3);
        assert_eq!(config.executor(), Err(ConfigError::ConflictingExecutors));
    }

    #[test]
    fn iterations_default_to_one_vu() {
        let mut config = ScenarioConfig::new("test");
        config.iterations = Some(10);
        assert_eq!(
            config.executor(),
            Ok(Executor::SharedIterations {
                vus: 1,
                iterations: 10,
                max_duration: DEFAULT_MAX_DURATION,
            })
        );
    }

    #[test]
    fn constant_vus_need_duration() {
        let mut config = ScenarioConfig::new("test");
        config.vus = Some(2);
        assert_eq!(config.executor(), Err(ConfigError::MissingDuration));

        config.duration = Some(Duration::from_secs(5));
        assert_eq!(
            config.executor(),
            Ok(Executor::ConstantVus {
                vus: 2,
                duration: Duration::from_secs(5),
            })
        );

        config.vus = Some(0);
        assert_eq!(config.executor(), Err(ConfigError::ZeroVus));
    }

    #[test]
    fn duration_alone_runs_one_vu() {
        let mut config = ScenarioConfig::new("test");
        config.duration = Some(Duration::from_secs(30));
        assert_eq!(
            config.executor(),
            Ok(Executor::ConstantVus {
                vus: 1,
                duration: Duration::from_secs(30),
            })
        );
    }

    #[test]
    fn nothing_configured() {
        assert_eq!(
            ScenarioConfig::new("test").executor(),
            Err(ConfigError::NoLoad)
        );

        let mut config = ScenarioConfig::new("test");
        config.stages = Some(LoadProfile::default());
        assert_eq!(config.executor(), Err(ConfigError::NoLoad));
    }
}
