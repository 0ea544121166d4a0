use medicall_load::config::Cli;
use medicall_load::{refresh_session, ApiClient, SessionContext};
use mock_service::{MockConfig, MockState};
use reqwest::Client;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::error;
use tracing_subscriber::FmtSubscriber;

#[allow(unused)]
pub const TEST_REFRESH_TOKEN: &str = "test-refresh-token";

#[allow(unused)]
pub const TEST_ELDER_ID: &str = "7";

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        let _ = FmtSubscriber::builder()
            .with_env_filter("loadrun=debug,medicall_load=debug,mock_service=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Start a mock on an ephemeral port; returns its `/api` base URL.
#[allow(unused)]
pub async fn start_mock(config: MockConfig) -> (String, Arc<MockState>) {
    init();
    let (addr, state) = mock_service::spawn(config).await.unwrap();
    (format!("http://{addr}/api"), state)
}

#[allow(unused)]
pub fn http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

#[allow(unused)]
pub async fn session(base_url: &str) -> SessionContext {
    refresh_session(&http_client(), base_url, TEST_REFRESH_TOKEN)
        .await
        .unwrap()
}

#[allow(unused)]
pub async fn api_client(base_url: &str) -> ApiClient {
    let session = session(base_url).await;
    ApiClient::new(http_client(), base_url, TEST_ELDER_ID, &session).unwrap()
}

/// CLI pointed at `base_url`, without pauses unless `extra` sets them.
#[allow(unused)]
pub fn test_cli(base_url: &str, extra: &[&str]) -> Cli {
    let mut args = vec![
        "medicall-load",
        "--base-url",
        base_url,
        "--refresh-token",
        TEST_REFRESH_TOKEN,
        "--elder-id",
        TEST_ELDER_ID,
    ];
    for flag in ["--pacing", "--max-jitter"] {
        if !extra.contains(&flag) {
            args.extend_from_slice(&[flag, "0s"]);
        }
    }
    args.extend_from_slice(extra);
    <Cli as clap::Parser>::parse_from(args)
}

/// Mock route key for a journey path template, e.g. `GET /api/elders/:elder_id/home`.
#[allow(unused)]
pub fn route_key(method: &str, template: &str) -> String {
    let template = template
        .replace("{elderId}", ":elder_id")
        .replace("{newElderId}", ":elder_id");
    format!("{method} /api{template}")
}
