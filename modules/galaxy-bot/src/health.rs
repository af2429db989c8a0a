use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

pub const ALIVE: &str = "Galaxy Bot is Alive!";

/// Liveness probe for the hosting platform.
pub fn build_router() -> Router {
    Router::new()
        .route("/", get(|| async { ALIVE }))
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind liveness endpoint on {addr}"))?;
    tracing::info!(%addr, "Liveness endpoint listening");
    axum::serve(listener, build_router())
        .await
        .context("Liveness server stopped")
}
