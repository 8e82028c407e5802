//! HTTP server exposing the extraction cascade.
//!
//! | Method | Path | Body | Response |
//! |--------|------|------|----------|
//! | POST | `/invoke` | `{"input": <request>}` | `{"output": <response>, "metadata": {"run_id": ..}}` |
//! | POST | `/batch` | `{"inputs": [<request>, ..]}` | `{"output": [..], "metadata": {"run_ids": [..]}}` |
//! | POST | `/extract` | `<request>` | `<response>` |
//! | GET | `/templates` | | registered templates and their fields |
//! | GET | `/health` | | status, version, uptime |
//!
//! Errors are returned as `{"error": {"code": .., "message": ..}}`; see
//! [`ApiError`] for the status mapping.

mod error;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::Router;
use axum::routing::{get, post};
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::engine::Orchestrator;

pub use error::{ApiError, ErrorBody, ErrorDetail};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub started_at: DateTime<Utc>,
    started: Instant,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

/// Build the router with every route mounted
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/invoke", post(routes::invoke))
        .route("/batch", post(routes::batch))
        .route("/extract", post(routes::extract))
        .route("/templates", get(routes::templates))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
///
/// # Errors
///
/// Fails when the address cannot be bound or the server stops with an I/O error.
pub async fn serve(orchestrator: Orchestrator, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let local = listener.local_addr().context("failed to read bound address")?;

    let router = build_router(AppState::new(orchestrator));
    info!(addr = %local, "xtract server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated")?;

    info!("xtract server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
}
