//! HTTP server: JSON API routes and the server-rendered dashboard.

pub mod error;
pub mod page;
pub mod routes;

use crate::core::RateProvider;
use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn RateProvider>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(provider: Arc<dyn RateProvider>, config: AppConfig) -> Self {
        AppState {
            provider,
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(page::dashboard))
        .route("/api/convert", get(routes::convert))
        .route("/api/history", get(routes::history))
        .route("/api/rates", get(routes::rates))
        .route("/api/currencies", get(routes::currencies))
        .with_state(state)
}

/// Serves the dashboard on an already bound listener until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!(%addr, "Dashboard listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
