use metrics_exporter_prometheus::PrometheusBuilder;
use mock_service::MockConfig;
use std::net::SocketAddr;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter("mock_service=info,tower_http=debug")
        .init();

    let addr: SocketAddr = std::env::var("MOCK_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;
    let refresh_token =
        std::env::var("MOCK_REFRESH_TOKEN").unwrap_or_else(|_| "mock-refresh-token".to_string());

    if let Ok(metrics_addr) = std::env::var("MOCK_METRICS_ADDR") {
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr.parse::<SocketAddr>()?)
            .install()?;
    }

    mock_service::run(addr, MockConfig::new(&refresh_token)).await
}
