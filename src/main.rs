use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use visit_counter::config::AppConfig;
use visit_counter::http::create_api_router;
use visit_counter::service::CounterService;
use visit_counter::store::CosmosConnector;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().context("initialize tracing subscriber")?;

    if let Err(err) = run().await {
        tracing::error!(error = ?err, "fatal counter service error");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("load configuration from environment")?;

    // Missing credentials are reported per request, not at startup
    if !config.has_endpoint() || !config.has_key() {
        warn!(
            has_endpoint = config.has_endpoint(),
            has_key = config.has_key(),
            "store credentials incomplete; requests will fail until configured"
        );
    }

    let addr = config.listen_address;
    info!(
        address = %addr,
        database = %config.cosmos_database,
        container = %config.cosmos_container,
        track_daily = config.track_daily,
        "visit counter starting"
    );

    let service = CounterService::new(Arc::new(config), Arc::new(CosmosConnector::new()));
    let app = create_api_router(Arc::new(service));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("visit counter stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "ctrl_c listener error");
    }
    info!("Shutdown signal received, exiting");
}

fn init_tracing() -> Result<()> {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow!("tracing subscriber init: {err}"))
}
