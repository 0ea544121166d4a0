use anyhow::Context;
use clap::Parser;
use medicall_load::config::{exit_status, Cli, SETUP_FAILURE_EXIT_CODE};
use medicall_load::{refresh_session, ApiClient, IterationContext};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::process::ExitCode;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("medicall_load=info,loadrun=info")),
        )
        .init();

    let cli = Cli::parse();

    if let Some(addr) = cli.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install the Prometheus exporter")?;
        info!("Serving metrics on {addr}");
    }

    let http = reqwest::Client::builder()
        .timeout(*cli.request_timeout)
        .build()
        .context("Failed to build the HTTP client")?;

    let session = match refresh_session(&http, &cli.base_url, &cli.refresh_token).await {
        Ok(session) => session,
        Err(err) => {
            error!("Setup failed: {err}");
            return Ok(ExitCode::from(SETUP_FAILURE_EXIT_CODE));
        }
    };

    let client = ApiClient::new(http, &cli.base_url, &cli.elder_id, &session)
        .context("Access token is not a valid header value")?;
    let ctx = IterationContext::new(client, &cli);

    let stats = medicall_load::run(ctx, &cli)
        .await
        .context("Invalid load configuration")?;

    println!("{stats}");

    for outcome in stats.failed_thresholds() {
        error!("Threshold crossed: {} {}", outcome.metric, outcome.predicate);
    }
    Ok(ExitCode::from(exit_status(&stats)))
}
