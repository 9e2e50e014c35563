//! Liveness endpoint.

use anyhow::{Context, Result};
use axum::{http::StatusCode, routing::get, Router};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Serves `GET /health` on `port`, returning 200 while the process is up.
pub async fn serve(port: u16, cancel: CancellationToken) -> Result<()> {
    let app = Router::new().route("/health", get(|| async { StatusCode::OK }));
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed binding health endpoint on port {port}"))?;
    info!(target: "health", port, "Health endpoint started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .context("health endpoint failed")
}
