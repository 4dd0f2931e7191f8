// # Unbound Webhook HTTP Servers
//
// This crate exposes the provider over HTTP:
//
// - **webhook**: the ExternalDNS webhook protocol, bound to
//   `WEBHOOK_HOST:WEBHOOK_PORT` (localhost by default, since only the
//   ExternalDNS sidecar talks to it)
// - **health**: liveness/readiness probes, bound to
//   `HEALTH_HOST:HEALTH_PORT`
//
// Both servers report their bound address on a oneshot channel once the
// listener is up, and stop serving when their shutdown future resolves.

pub mod health;
pub mod webhook;

pub use webhook::{MEDIA_TYPE, WebhookError};

use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

async fn serve<F>(
    name: &'static str,
    address: &str,
    router: Router,
    started: oneshot::Sender<SocketAddr>,
    shutdown: F,
) -> unbound_webhook_core::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(address).await?;
    let local = listener.local_addr()?;
    tracing::info!("Started {} server on {}", name, local);

    if started.send(local).is_err() {
        tracing::debug!("Nobody is waiting for the {} server to start", name);
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("Stopped {} server", name);
    Ok(())
}
