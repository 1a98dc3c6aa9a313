mod config;
mod http;
mod notifiers;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use klaxon_adapters::source::AlertmanagerParser;
use klaxon_app::service::IncidentService;

use crate::config::ServerConfig;
use crate::http::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = ServerConfig::from_env()?;
    let routes = notifiers::build_routes(&config);
    if routes.is_empty() {
        warn!("no notification channels configured, nobody will be paged");
    }

    let (service, tasks) = IncidentService::start(config.service, routes);
    let service = Arc::new(service);
    let state = AppState {
        incidents: service.clone(),
        intake: service,
        parser: Arc::new(AlertmanagerParser),
    };

    let listener = TcpListener::bind(config.listen_addr).await?;
    info!(
        addr = %config.listen_addr,
        queue_capacity = config.service.queue_capacity,
        interval_secs = config.service.notify_interval.as_secs(),
        "klaxon listening"
    );

    axum::serve(listener, http::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tasks.aggregator.abort();
    tasks.trigger.abort();
    info!("klaxon stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
