use clap::Parser;
use loadrun::core::{
    ConfigError, LoadProfile, RunStatistics, Stage, ThresholdEntry, ThresholdMetric, Thresholds,
};
use loadrun::scenario::{ConfigurableScenario, RunResult};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://medicare-call.shop/api";

/// Value shipped in templates in place of a real token; never sent.
pub const PLACEHOLDER_REFRESH_TOKEN: &str = "YOUR_ACTUAL_REFRESH_TOKEN_HERE";

/// Process exit code when at least one threshold is crossed.
pub const THRESHOLD_EXIT_CODE: u8 = 99;

/// Process exit code when setup aborts the run.
pub const SETUP_FAILURE_EXIT_CODE: u8 = 1;

/// Exit code for a run that got past setup.
pub fn exit_status(stats: &RunStatistics) -> u8 {
    if stats.passed() {
        0
    } else {
        THRESHOLD_EXIT_CODE
    }
}

/// Ramp to 50 VUs over a minute, hold 100 for three, ramp down over one.
pub fn default_stages() -> LoadProfile {
    vec![
        Stage::new(Duration::from_secs(60), 50),
        Stage::new(Duration::from_secs(180), 100),
        Stage::new(Duration::from_secs(60), 0),
    ]
    .into()
}

/// Under 1% failed requests and p95 latency below 200ms.
pub fn default_thresholds() -> Result<Thresholds, ConfigError> {
    Thresholds::new()
        .with(ThresholdMetric::HttpReqFailed, "rate<0.01")?
        .with(ThresholdMetric::HttpReqDuration, "p(95)<200")
}

/// Load test of the MediCare Call API.
#[derive(Parser, Debug, Clone)]
#[command(version, about)]
pub struct Cli {
    /// API root, including the `/api` prefix.
    #[arg(long, env = "MEDICALL_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Refresh token exchanged once for the access token used by every VU.
    #[arg(long, env = "MEDICALL_REFRESH_TOKEN", default_value = "", hide_env_values = true)]
    pub refresh_token: String,

    /// Elder whose data the journey reads.
    #[arg(long, env = "MEDICALL_ELDER_ID", default_value = "")]
    pub elder_id: String,

    /// Load stage as DURATION:TARGET (e.g. `1m:50`). Repeat for several stages.
    #[arg(long = "stage", value_name = "DURATION:TARGET")]
    pub stages: Vec<Stage>,

    /// Threshold as METRIC=EXPR (e.g. `http_req_duration=p(95)<200`). Repeatable.
    #[arg(long = "threshold", value_name = "METRIC=EXPR")]
    pub thresholds: Vec<ThresholdEntry>,

    /// Fixed number of VUs, used instead of stages.
    #[arg(long, conflicts_with = "stages")]
    pub vus: Option<usize>,

    /// Total iterations shared by the VUs.
    #[arg(long, conflicts_with = "stages")]
    pub iterations: Option<u64>,

    /// Maximum run time.
    #[arg(long)]
    pub duration: Option<humantime::Duration>,

    /// Sleep after every step.
    #[arg(long, default_value = "1s")]
    pub pacing: humantime::Duration,

    /// Upper bound of the random sleep at the end of an iteration.
    #[arg(long, default_value = "3s")]
    pub max_jitter: humantime::Duration,

    /// Cap on requests per second across all VUs.
    #[arg(long)]
    pub rps: Option<NonZeroU32>,

    /// Also run the write steps (registration, updates, payment reservation).
    #[arg(long)]
    pub enable_writes: bool,

    /// Per-request timeout.
    #[arg(long, default_value = "60s")]
    pub request_timeout: humantime::Duration,

    /// Time in-flight iterations get to finish at the end of the run.
    #[arg(long, default_value = "30s")]
    pub graceful_stop: humantime::Duration,

    /// Serve Prometheus metrics on this address.
    #[arg(long, env = "MEDICALL_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,
}

impl Cli {
    /// Stages to run; the default profile when no other executor was asked for.
    pub fn load_profile(&self) -> Option<LoadProfile> {
        if !self.stages.is_empty() {
            Some(self.stages.clone().into())
        } else if self.vus.is_none() && self.iterations.is_none() && self.duration.is_none() {
            Some(default_stages())
        } else {
            None
        }
    }

    pub fn thresholds(&self) -> Result<Thresholds, ConfigError> {
        if self.thresholds.is_empty() {
            default_thresholds()
        } else {
            Ok(self.thresholds.iter().cloned().collect())
        }
    }

    /// Apply the load settings to a scenario.
    pub fn configure<S>(&self, scenario: S) -> Result<S, ConfigError>
    where
        S: ConfigurableScenario<RunResult>,
    {
        let mut scenario = scenario
            .thresholds(self.thresholds()?)
            .graceful_stop(*self.graceful_stop);

        if let Some(profile) = self.load_profile() {
            scenario = scenario.stages(profile);
        }
        if let Some(vus) = self.vus {
            scenario = scenario.vus(vus);
        }
        if let Some(iterations) = self.iterations {
            scenario = scenario.iterations(iterations);
        }
        if let Some(duration) = &self.duration {
            scenario = scenario.duration(**duration);
        }
        if let Some(rps) = self.rps {
            scenario = scenario.rps(rps);
        }

        Ok(scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadrun::core::ThresholdOutcome;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["medicall-load"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_match_the_standard_run() {
        let cli = parse(&["--base-url", "http://localhost/api"]);
        assert_eq!(cli.load_profile(), Some(default_stages()));
        assert_eq!(cli.thresholds().unwrap(), default_thresholds().unwrap());
        assert_eq!(*cli.pacing, Duration::from_secs(1));
        assert_eq!(*cli.max_jitter, Duration::from_secs(3));
        assert!(!cli.enable_writes);
    }

    #[test]
    fn default_profile_peaks_at_one_hundred() {
        let profile = default_stages();
        assert_eq!(profile.peak(), 100);
        assert_eq!(profile.total_duration(), Duration::from_secs(300));
    }

    #[test]
    fn parses_stages_and_thresholds() {
        let cli = parse(&[
            "--stage",
            "10s:5",
            "--stage",
            "20s:0",
            "--threshold",
            "checks=rate>0.99",
        ]);
        let profile = cli.load_profile().unwrap();
        assert_eq!(profile.stages().len(), 2);
        assert_eq!(profile.peak(), 5);
        assert_eq!(cli.thresholds().unwrap().len(), 1);
    }

    #[test]
    fn explicit_vus_replace_default_stages() {
        let cli = parse(&["--vus", "2", "--iterations", "10"]);
        assert_eq!(cli.load_profile(), None);
    }

    #[test]
    fn duration_alone_is_not_staged() {
        let cli = parse(&["--duration", "30s"]);
        assert_eq!(cli.load_profile(), None);
        assert_eq!(cli.duration.as_deref(), Some(&Duration::from_secs(30)));
    }

    #[test]
    fn crossed_threshold_exits_ninety_nine() {
        let mut stats = RunStatistics::default();
        assert_eq!(exit_status(&stats), 0);

        stats.thresholds.push(ThresholdOutcome {
            metric: ThresholdMetric::HttpReqFailed,
            predicate: "rate<0.01".parse().unwrap(),
            observed: Some(0.5),
            passed: false,
        });
        assert_eq!(exit_status(&stats), THRESHOLD_EXIT_CODE);
        assert_eq!(THRESHOLD_EXIT_CODE, 99);
        assert_ne!(SETUP_FAILURE_EXIT_CODE, 0);
        assert_ne!(SETUP_FAILURE_EXIT_CODE, THRESHOLD_EXIT_CODE);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Cli::try_parse_from(["medicall-load", "--stage", "fast:5"]).is_err());
        assert!(Cli::try_parse_from(["medicall-load", "--threshold", "latency=p(95)<200"]).is_err());
        assert!(Cli::try_parse_from(["medicall-load", "--stage", "1m:5", "--vus", "3"]).is_err());
    }
}
