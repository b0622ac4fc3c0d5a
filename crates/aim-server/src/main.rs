//! AIM Server - HTTP trigger shell
//!
//! Exposes the sync pipeline behind a single `POST /sync` endpoint. The
//! handler runs one full sync and returns a literal success message; any
//! pipeline failure surfaces as a server error with the diagnostics in the
//! logs.

mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;

use aim_core::logging::{init_logging, LogConfig};
use aim_core::{SyncConfig, SyncPipeline};

use error::AppError;

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    pipeline: Arc<SyncPipeline>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with configuration from environment
    let log_config = LogConfig::from_env()?;
    init_logging(&log_config)?;

    info!("Starting AIM server");

    // Load configuration; an invalid configuration is fatal at startup
    let config = SyncConfig::load()?;
    info!(
        "Configuration loaded: {} source projects, staging bucket {}",
        config.projects.len(),
        config.staging_bucket
    );

    let state = AppState {
        pipeline: Arc::new(SyncPipeline::new(config)),
    };

    let app = create_router(state);

    let host = std::env::var("AIM_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("AIM_PORT").unwrap_or_else(|_| "8080".to_string());
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Create the application router
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/sync", post(run_sync))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Health check handler
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

/// Run one full sync, replacing the destination database contents
async fn run_sync(State(state): State<AppState>) -> Result<(StatusCode, &'static str), AppError> {
    state.pipeline.run().await?;
    Ok((StatusCode::OK, "Sync completed successfully"))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
