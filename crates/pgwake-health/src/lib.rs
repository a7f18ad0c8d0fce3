//! pgwake-health — liveness and readiness over HTTP.
//!
//! | Method | Path | Response |
//! |---|---|---|
//! | GET | `/health` | `200` while the process is up |
//! | GET | `/ready` | `200` once the sync gate is armed, `503` before |

use std::net::SocketAddr;

use anyhow::Context;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use pgwake_core::SyncGate;

/// Build the health router.
pub fn build_router(gate: SyncGate) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .with_state(gate)
}

/// GET /health
async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /ready
async fn ready(State(gate): State<SyncGate>) -> StatusCode {
    if gate.is_armed() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Serve the health endpoints until shutdown is signalled.
pub async fn serve(
    addr: SocketAddr,
    gate: SyncGate,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind health endpoint on {addr}"))?;

    info!(%addr, "health endpoint listening");

    axum::serve(listener, build_router(gate))
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await
        .context("health server error")
}
