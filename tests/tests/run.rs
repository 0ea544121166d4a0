mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;
    use loadrun::core::ThresholdMetric;
    use medicall_load::{run, run_iteration, IterationContext, IterationReport};
    use mock_service::MockConfig;
    use std::time::{Duration, Instant};

    #[tokio::test(flavor = "multi_thread")]
    #[ntest::timeout(30_000)]
    async fn iterations_issue_fifteen_gets_each() {
        let (base_url, mock) = start_mock(MockConfig::new(TEST_REFRESH_TOKEN)).await;
        let cli = test_cli(&base_url, &["--vus", "2", "--iterations", "6"]);

        let ctx = IterationContext::new(api_client(&base_url).await, &cli);
        let stats = run(ctx, &cli).await.unwrap();

        assert_eq!(stats.iterations, 6);
        assert_eq!(stats.transactions(), 90);
        assert_eq!(stats.error, 0);
        assert_eq!(mock.hits_by_method("GET"), 90);
        assert_eq!(mock.hits("POST /api/auth/refresh"), 1);
        assert_eq!(mock.hits_by_method("POST"), 1);
        assert!(stats.passed(), "{stats}");

        let home = stats.check("home status is 200").unwrap();
        assert_eq!(home.passes, 6);
        assert_eq!(home.fails, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ntest::timeout(30_000)]
    async fn failing_endpoint_crosses_error_threshold() {
        let config = MockConfig::new(TEST_REFRESH_TOKEN).failing("/api/notices");
        let (base_url, mock) = start_mock(config).await;
        let cli = test_cli(&base_url, &["--vus", "1", "--iterations", "4"]);

        let ctx = IterationContext::new(api_client(&base_url).await, &cli);
        let stats = run(ctx, &cli).await.unwrap();

        // One of fifteen calls fails every iteration; the run itself goes on.
        assert_eq!(stats.iterations, 4);
        assert_eq!(stats.error, 4);
        assert_eq!(mock.hits_by_method("GET"), 60);
        assert!(!stats.passed());

        let failed: Vec<_> = stats.failed_thresholds().map(|o| o.metric).collect();
        assert_eq!(failed, vec![ThresholdMetric::HttpReqFailed]);

        let notices = stats.check("notice list status is 200").unwrap();
        assert_eq!(notices.fails, 4);
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ntest::timeout(30_000)]
    async fn custom_thresholds_replace_defaults() {
        let (base_url, _mock) = start_mock(MockConfig::new(TEST_REFRESH_TOKEN)).await;
        let cli = test_cli(
            &base_url,
            &[
                "--vus",
                "1",
                "--iterations",
                "2",
                "--threshold",
                "iterations=count>=2",
                "--threshold",
                "checks=rate==1",
            ],
        );

        let ctx = IterationContext::new(api_client(&base_url).await, &cli);
        let stats = run(ctx, &cli).await.unwrap();

        assert_eq!(stats.thresholds.len(), 2);
        assert!(stats.passed(), "{stats}");
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn iteration_paces_between_steps() {
        let (base_url, mock) = start_mock(MockConfig::new(TEST_REFRESH_TOKEN)).await;
        let cli = test_cli(&base_url, &["--pacing", "20ms", "--max-jitter", "0s"]);
        let ctx = IterationContext::new(api_client(&base_url).await, &cli);

        let start = Instant::now();
        let report = run_iteration(&ctx).await;

        assert_eq!(
            report,
            IterationReport {
                passed: 15,
                failed: 0,
                skipped: 0
            }
        );
        assert!(start.elapsed() >= Duration::from_millis(15 * 20));
        assert_eq!(mock.hits_by_method("GET"), 15);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn stages_conflicting_with_vus_are_rejected() {
        let (base_url, mock) = start_mock(MockConfig::new(TEST_REFRESH_TOKEN)).await;
        let mut cli = test_cli(&base_url, &["--stage", "1s:1"]);
        cli.vus = Some(2);

        let ctx = IterationContext::new(api_client(&base_url).await, &cli);
        assert!(run(ctx, &cli).await.is_err());
        assert_eq!(mock.hits_by_method("GET"), 0);
    }
}
