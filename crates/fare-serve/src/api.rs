//! Router and server loop.

use crate::config::ServeConfig;
use crate::error::{Result, ServeError};
use crate::handlers;
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;

/// Routes of the prediction service.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/predict", post(handlers::predict))
        .with_state(state)
}

/// Serve until ctrl-c.
pub async fn serve(config: &ServeConfig, state: Arc<AppState>) -> Result<()> {
    let address = config.address();
    let addr: SocketAddr = address.parse().map_err(|e: std::net::AddrParseError| {
        ServeError::InvalidAddress {
            address: address.clone(),
            reason: e.to_string(),
        }
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Prediction service listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Prediction service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
