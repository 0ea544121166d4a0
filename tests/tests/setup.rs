mod utils;
#[allow(unused)]
use utils::*;

mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use medicall_load::config::PLACEHOLDER_REFRESH_TOKEN;
    use medicall_load::{refresh_session, SetupError};
    use mock_service::MockConfig;
    use reqwest::StatusCode;
    use serde_json::json;

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn valid_token_yields_session() {
        let (base_url, mock) = start_mock(MockConfig::new(TEST_REFRESH_TOKEN)).await;

        let session = refresh_session(&http_client(), &base_url, TEST_REFRESH_TOKEN)
            .await
            .unwrap();

        assert!(!session.access_token().is_empty());
        assert!(!session.refresh_token().is_empty());
        assert_eq!(session.token_type, "Bearer");
        assert_eq!(mock.hits("POST /api/auth/refresh"), 1);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn placeholder_token_aborts_without_request() {
        let (base_url, mock) = start_mock(MockConfig::new(TEST_REFRESH_TOKEN)).await;

        let res = refresh_session(&http_client(), &base_url, PLACEHOLDER_REFRESH_TOKEN).await;

        assert!(matches!(res, Err(SetupError::InvalidPresetToken)));
        assert_eq!(mock.total_hits(), 0);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn empty_token_aborts_without_request() {
        let (base_url, mock) = start_mock(MockConfig::new(TEST_REFRESH_TOKEN)).await;

        let res = refresh_session(&http_client(), &base_url, "").await;

        assert!(matches!(res, Err(SetupError::InvalidPresetToken)));
        assert_eq!(mock.total_hits(), 0);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn rejected_token_aborts() {
        let (base_url, mock) = start_mock(MockConfig::new(TEST_REFRESH_TOKEN)).await;

        let res = refresh_session(&http_client(), &base_url, "stale-token").await;

        match res {
            Err(SetupError::MissingTokens { status }) => {
                assert_eq!(status, StatusCode::UNAUTHORIZED)
            }
            other => panic!("expected missing tokens, got {other:?}"),
        }
        assert_eq!(mock.hits("POST /api/auth/refresh"), 1);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn partial_token_response_aborts() {
        init();
        let app = Router::new().route(
            "/api/auth/refresh",
            post(|| async { Json(json!({ "accessToken": "only-access", "refreshToken": "" })) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });

        let res = refresh_session(&http_client(), &format!("http://{addr}/api"), "token").await;

        assert!(matches!(
            res,
            Err(SetupError::MissingTokens {
                status: StatusCode::OK
            })
        ));
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn unreachable_service_aborts() {
        init();
        let res = refresh_session(&http_client(), "http://127.0.0.1:1/api", "token").await;
        assert!(matches!(res, Err(SetupError::Request(_))));
    }
}
