//! Studio portal API server
//!
//! (c) Softlandia 2025

use studio_portal_api::config::AppConfig;
use studio_portal_api::infrastructure::database::DatabaseConnection;

use anyhow::{Context, anyhow};
use axum::http::{HeaderValue, Method};
use log::{info, warn};
use tokio::runtime::{Builder, Runtime};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt::init();

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(web_server_task())
}

async fn web_server_task() -> anyhow::Result<()> {
    let provider = studio_portal_api::services()
        .build_provider()
        .map_err(|e| anyhow!("invalid service registrations: {e:?}"))?;

    let config = provider.get_required::<AppConfig>();

    provider
        .get_required::<DatabaseConnection>()
        .run_migrations()
        .await
        .context("failed to run database migrations")?;

    if config.cms_webhook_secret.is_none() {
        warn!("CMS_WEBHOOK_SECRET is not set, CMS webhooks will be rejected");
    }

    let origins = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(origin) => Some(origin),
            Err(_) => {
                warn!("ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect::<Vec<_>>();

    let app = studio_portal_api::app(provider).layer(
        ServiceBuilder::new().layer(
            CorsLayer::new()
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST, Method::PATCH])
                .allow_origin(origins),
        ),
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("cannot bind {}", config.bind_address))?;
    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
    }
}
