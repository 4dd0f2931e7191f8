//! ExternalDNS webhook protocol
//!
//! ## Routes
//!
//! | Method | Path               | Request        | Response              |
//! |--------|--------------------|----------------|-----------------------|
//! | GET    | `/`                | Accept         | domain filter, 200    |
//! | GET    | `/records`         | Accept         | `[Endpoint]`, 200     |
//! | POST   | `/records`         | `Changes` body | 204                   |
//! | POST   | `/adjustendpoints` | `[Endpoint]`   | `[Endpoint]`, 200     |
//!
//! Every request and response body uses [`MEDIA_TYPE`].

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use unbound_webhook_core::{Changes, Endpoint, Provider, ServerOptions};

/// Versioned media type of the webhook protocol
pub const MEDIA_TYPE: &str = "application/external.dns.webhook+json;version=1";

/// Request rejection or provider failure, mapped to a status code
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("client must accept application/external.dns.webhook+json;version=1")]
    NotAcceptable,

    #[error("client must send application/external.dns.webhook+json;version=1")]
    UnsupportedMediaType,

    #[error("malformed request body: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Provider(#[from] unbound_webhook_core::Error),
}

impl WebhookError {
    fn status(&self) -> StatusCode {
        match self {
            WebhookError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            WebhookError::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            WebhookError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebhookError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}

/// Build the webhook router around a provider
pub fn router(provider: Arc<dyn Provider>, options: &ServerOptions) -> Router {
    Router::new()
        .route("/", get(negotiate))
        .route("/records", get(records).post(apply_changes))
        .route("/adjustendpoints", post(adjust_endpoints))
        .with_state(provider)
        .layer(TimeoutLayer::new(options.request_timeout()))
        .layer(TraceLayer::new_for_http())
}

/// Bind the webhook address and serve until `shutdown` resolves
///
/// The bound address is sent on `started` once the listener is up.
pub async fn start<F>(
    provider: Arc<dyn Provider>,
    options: &ServerOptions,
    started: oneshot::Sender<SocketAddr>,
    shutdown: F,
) -> unbound_webhook_core::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    crate::serve(
        "webhook",
        &options.webhook_address(),
        router(provider, options),
        started,
        shutdown,
    )
    .await
}

async fn negotiate(
    State(provider): State<Arc<dyn Provider>>,
    headers: HeaderMap,
) -> Result<Response, WebhookError> {
    require_accept(&headers)?;

    let mut response = webhook_json(StatusCode::OK, provider.domain_filter())?;
    response
        .headers_mut()
        .insert(header::VARY, HeaderValue::from_static("Content-Type"));
    Ok(response)
}

async fn records(
    State(provider): State<Arc<dyn Provider>>,
    headers: HeaderMap,
) -> Result<Response, WebhookError> {
    require_accept(&headers)?;

    let endpoints = provider.records().await?;
    tracing::debug!("Returning {} record(s)", endpoints.len());
    webhook_json(StatusCode::OK, &endpoints)
}

async fn apply_changes(
    State(provider): State<Arc<dyn Provider>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, WebhookError> {
    require_content_type(&headers)?;

    let changes: Changes = parse_body(&body)?;
    tracing::debug!(
        create = changes.create.len(),
        update_old = changes.update_old.len(),
        update_new = changes.update_new.len(),
        delete = changes.delete.len(),
        "Applying changes"
    );

    provider.apply_changes(changes).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn adjust_endpoints(
    State(provider): State<Arc<dyn Provider>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookError> {
    require_content_type(&headers)?;
    require_accept(&headers)?;

    let endpoints: Vec<Endpoint> = parse_body(&body)?;
    let adjusted = provider.adjust_endpoints(endpoints).await?;
    webhook_json(StatusCode::OK, &adjusted)
}

fn require_accept(headers: &HeaderMap) -> Result<(), WebhookError> {
    let accepted = headers
        .get_all(header::ACCEPT)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(is_media_type);

    if accepted {
        Ok(())
    } else {
        Err(WebhookError::NotAcceptable)
    }
}

fn require_content_type(headers: &HeaderMap) -> Result<(), WebhookError> {
    match headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        Some(value) if is_media_type(value) => Ok(()),
        _ => Err(WebhookError::UnsupportedMediaType),
    }
}

/// Compare against the media type, ignoring case and whitespace
fn is_media_type(value: &str) -> bool {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    compact.eq_ignore_ascii_case(MEDIA_TYPE)
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, WebhookError> {
    serde_json::from_slice(body).map_err(|e| WebhookError::BadRequest(e.to_string()))
}

fn webhook_json<T: Serialize + ?Sized>(
    status: StatusCode,
    value: &T,
) -> Result<Response, WebhookError> {
    let body = serde_json::to_vec(value).map_err(unbound_webhook_core::Error::from)?;
    Ok((
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE))],
        body,
    )
        .into_response())
}
