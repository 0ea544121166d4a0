mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;
    use medicall_load::journey::{Endpoint, Journey, Step};
    use medicall_load::{ApiClient, IterationState, SessionContext};
    use mock_service::{MockConfig, REGISTERED_ELDER_ID};

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn every_read_step_succeeds_on_its_own() {
        let (base_url, mock) = start_mock(MockConfig::new(TEST_REFRESH_TOKEN)).await;
        let client = api_client(&base_url).await;

        for step in Journey::read_only().steps() {
            let mut state = IterationState::new(1);
            let passed = client.run_step(step, &mut state).await;

            assert_eq!(passed, Some(true), "step {}", step.number);
            let key = route_key("GET", step.endpoint.path_template());
            assert!(mock.hits(&key) >= 1, "{key} was not called");
        }

        assert_eq!(mock.hits_by_method("GET"), 15);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn server_error_fails_the_step() {
        let config = MockConfig::new(TEST_REFRESH_TOKEN).failing("/api/notices");
        let (base_url, _mock) = start_mock(config).await;
        let client = api_client(&base_url).await;

        let notices = Step {
            number: 19,
            endpoint: Endpoint::Notices,
        };
        let mut state = IterationState::new(1);
        assert_eq!(client.run_step(&notices, &mut state).await, Some(false));

        let member = Step {
            number: 2,
            endpoint: Endpoint::Member,
        };
        assert_eq!(client.run_step(&member, &mut state).await, Some(true));
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn unknown_bearer_fails_the_step() {
        let (base_url, _mock) = start_mock(MockConfig::new(TEST_REFRESH_TOKEN)).await;
        let forged = SessionContext::new("forged".to_string(), "forged".to_string());
        let client = ApiClient::new(http_client(), &base_url, TEST_ELDER_ID, &forged).unwrap();

        let home = Step {
            number: 1,
            endpoint: Endpoint::Home,
        };
        let mut state = IterationState::new(1);
        assert_eq!(client.run_step(&home, &mut state).await, Some(false));
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn update_elder_waits_for_registration() {
        let (base_url, mock) = start_mock(MockConfig::new(TEST_REFRESH_TOKEN)).await;
        let client = api_client(&base_url).await;

        let update = Step {
            number: 11,
            endpoint: Endpoint::UpdateElder,
        };
        let mut state = IterationState::new(1);
        assert_eq!(client.run_step(&update, &mut state).await, None);
        assert_eq!(mock.hits("POST /api/elders/:elder_id"), 0);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn enabled_writes_are_issued() {
        let (base_url, mock) = start_mock(MockConfig::new(TEST_REFRESH_TOKEN)).await;
        let client = api_client(&base_url).await;

        let mut state = IterationState::new(3);
        for step in Journey::with_writes().steps() {
            let passed = client.run_step(step, &mut state).await;
            assert_eq!(passed, Some(true), "step {}", step.number);
        }

        assert_eq!(
            state.new_elder_id,
            Some(REGISTERED_ELDER_ID.to_string())
        );
        // Six writes plus the refresh call.
        assert_eq!(mock.hits_by_method("POST"), 7);
        assert_eq!(mock.hits("POST /api/elders/:elder_id"), 1);
        assert_eq!(mock.hits_by_method("GET"), 15);
    }
}
