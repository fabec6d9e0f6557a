//! School Admin RS Server
//!
//! HTTP server for staff, student and user records with their attachments.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sa_api::AppState;
use sa_core::config::{AppConfig, LoggingConfig};

mod health;

use health::HealthChecker;

const DEFAULT_FILTER: &str =
    "info,sa_server=debug,sa_api=debug,sa_attachments=debug,tower_http=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config_file = std::env::var("SA_CONFIG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config/default.toml"));
    let config = AppConfig::load(Some(&config_file))?;

    init_tracing(&config.logging);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        storage_root = %config.storage.root,
        "Starting School Admin RS"
    );

    prepare_storage(&config).await?;

    let addr = config.server_addr();
    let app = build_router(&config)?;

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        logging
            .filter
            .clone()
            .unwrap_or_else(|| DEFAULT_FILTER.to_string())
            .into()
    });

    let json = logging.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
    });
    let text = (!logging.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(text)
        .init();
}

/// Create the uploads and staging directories below the storage root
async fn prepare_storage(config: &AppConfig) -> anyhow::Result<()> {
    let root = config.storage_root();
    for dir in [&config.storage.uploads_dir, &config.storage.staging_dir] {
        tokio::fs::create_dir_all(root.join(dir)).await?;
    }
    Ok(())
}

/// Build the application router
fn build_router(config: &AppConfig) -> anyhow::Result<Router> {
    let root = config.storage_root();
    let health = Arc::new(
        HealthChecker::new(Duration::from_secs(10))
            .with_directory("uploads", root.join(&config.storage.uploads_dir))
            .with_directory("staging", root.join(&config.storage.staging_dir)),
    );

    let health_routes = Router::new()
        .route("/health", get(health::liveness))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(health);

    let state = AppState::new(config.clone())?;
    let api_routes = sa_api::router().with_state(state);

    Ok(Router::new()
        .merge(health_routes)
        .merge(api_routes)
        .layer(DefaultBodyLimit::disable())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_seconds,
                )))
                .layer(RequestBodyLimitLayer::new(config.server.max_body_size_bytes))
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        ))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
