//! Liveness and readiness probes
//!
//! - `/` and `/ready`: 200 when ready, 503 otherwise
//! - `/health`: 200 when healthy, 503 otherwise
//!
//! The handlers only read the shared flags; nothing else feeds into them.

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::timeout::TimeoutLayer;
use unbound_webhook_core::{HealthStatus, ServerOptions};

/// Build the probe router
pub fn router(status: Arc<HealthStatus>, options: &ServerOptions) -> Router {
    Router::new()
        .route("/", get(ready))
        .route("/ready", get(ready))
        .route("/health", get(healthy))
        .with_state(status)
        .layer(TimeoutLayer::new(options.request_timeout()))
}

/// Bind the health address and serve until `shutdown` resolves
///
/// The bound address is sent on `started` once the listener is up, before
/// either flag is set by the caller.
pub async fn start<F>(
    status: Arc<HealthStatus>,
    options: &ServerOptions,
    started: oneshot::Sender<SocketAddr>,
    shutdown: F,
) -> unbound_webhook_core::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    crate::serve(
        "health",
        &options.health_address(),
        router(status, options),
        started,
        shutdown,
    )
    .await
}

async fn ready(State(status): State<Arc<HealthStatus>>) -> (StatusCode, &'static str) {
    probe(status.is_ready())
}

async fn healthy(State(status): State<Arc<HealthStatus>>) -> (StatusCode, &'static str) {
    probe(status.is_healthy())
}

fn probe(up: bool) -> (StatusCode, &'static str) {
    if up {
        (StatusCode::OK, "OK")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable")
    }
}
