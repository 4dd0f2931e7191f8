// # unbound-webhookd - Unbound ExternalDNS Webhook Daemon
//
// Thin integration layer: all provider logic lives in unbound-webhook-core,
// the resolver client in unbound-webhook-control and the HTTP surface in
// unbound-webhook-server.
//
// The daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Starting the health server, then the webhook server
// 4. Flipping health/readiness around the serving period
//
// Probes answer 503 until the webhook listener is bound. On SIGTERM or
// SIGINT both flags drop and the process exits straight away; in-flight
// webhook requests are not waited for.
//
// ## Configuration
//
// ### Resolver
// - `UNBOUND_HOST`: control endpoint, `host[:port]` or unix socket path (required)
// - `UNBOUND_CA_PEM_PATH`, `UNBOUND_CERT_PEM_PATH`, `UNBOUND_KEY_PEM_PATH`: TLS material
//
// ### Provider
// - `DRY_RUN`: log changes without applying them
// - `DEFAULT_TTL`: TTL for endpoints without one (default 300)
// - `DOMAIN_FILTER`, `EXCLUDE_DOMAIN_FILTER`: comma-separated domains
// - `REGEXP_DOMAIN_FILTER`, `REGEXP_DOMAIN_FILTER_EXCLUSION`: regex pair
//
// ### Servers
// - `WEBHOOK_HOST` / `WEBHOOK_PORT` (default localhost:8888)
// - `HEALTH_HOST` / `HEALTH_PORT` (default 0.0.0.0:8080)
// - `READ_TIMEOUT` / `WRITE_TIMEOUT` in milliseconds (default 60000)
//
// ### Logging
// - `LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `LOG_FORMAT`: text or json (default text)
//
// ## Example
//
// ```bash
// export UNBOUND_HOST=127.0.0.1:8953
// export DOMAIN_FILTER=lan
//
// unbound-webhookd
// ```

use anyhow::{Context, Result, anyhow};
use std::future::Future;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use unbound_webhook_control::UnboundControlClient;
use unbound_webhook_core::{
    DomainFilter, EngineSettings, HealthStatus, Provider, ProviderConfig, ServerOptions,
    UnboundProvider,
};
use unbound_webhook_server::{health, webhook};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WebhookExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<WebhookExitCode> for ExitCode {
    fn from(code: WebhookExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Why the daemon stopped early
#[derive(Debug)]
enum Failure {
    Startup(anyhow::Error),
    Runtime(anyhow::Error),
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogSettings {
    level: String,
    format: LogFormat,
}

impl LogSettings {
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let level = lookup("LOG_LEVEL")
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "info".to_string());

        match level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                level
            ),
        }

        let format = match lookup("LOG_FORMAT")
            .map(|v| v.trim().to_lowercase())
            .unwrap_or_default()
            .as_str()
        {
            "" | "text" => LogFormat::Text,
            "json" => LogFormat::Json,
            other => anyhow::bail!(
                "LOG_FORMAT '{}' is not valid. Valid formats: text, json",
                other
            ),
        };

        Ok(Self { level, format })
    }

    /// Initialize the global subscriber; `RUST_LOG` overrides the level
    fn init(&self) -> Result<()> {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false);

        match self.format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Text => builder.compact().try_init(),
        }
        .map_err(|e| anyhow!("Failed to set tracing subscriber: {}", e))
    }
}

fn main() -> ExitCode {
    let logging = match LogSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return WebhookExitCode::ConfigError.into();
        }
    };

    if let Err(e) = logging.init() {
        eprintln!("{}", e);
        return WebhookExitCode::ConfigError.into();
    }

    info!("Starting unbound-webhookd {}", env!("CARGO_PKG_VERSION"));

    let options = match ServerOptions::from_env() {
        Ok(options) => options,
        Err(e) => {
            error!("Server configuration error: {}", e);
            return WebhookExitCode::ConfigError.into();
        }
    };

    let config = match ProviderConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Provider configuration error: {}", e);
            return WebhookExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return WebhookExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(async {
        match run_daemon(options, config).await {
            Ok(()) => WebhookExitCode::CleanShutdown,
            Err(Failure::Startup(e)) => {
                error!("Startup error: {:#}", e);
                WebhookExitCode::ConfigError
            }
            Err(Failure::Runtime(e)) => {
                error!("Daemon error: {:#}", e);
                WebhookExitCode::RuntimeError
            }
        }
    });

    // Abandon in-flight requests instead of waiting on them
    rt.shutdown_background();
    code.into()
}

/// Run the daemon until a shutdown signal or a server failure
async fn run_daemon(
    options: ServerOptions,
    config: ProviderConfig,
) -> std::result::Result<(), Failure> {
    // Health first, so probes answer 503 while the provider comes up
    let starting = Starting::health(&options).await.map_err(Failure::Startup)?;

    let provider = build_provider(&config).map_err(Failure::Startup)?;

    let serving = starting
        .webhook(provider, &options)
        .await
        .map_err(Failure::Startup)?;

    serving.until(wait_for_shutdown()).await
}

type ServerTask = JoinHandle<unbound_webhook_core::Result<()>>;

/// Health server listening, webhook not yet started
struct Starting {
    status: Arc<HealthStatus>,
    health: ServerTask,
    health_address: SocketAddr,
}

impl Starting {
    /// Bind the health server with both flags down
    async fn health(options: &ServerOptions) -> Result<Self> {
        let status = Arc::new(HealthStatus::new());
        let (started_tx, started_rx) = oneshot::channel();
        let mut health = {
            let status = Arc::clone(&status);
            let options = options.clone();
            tokio::spawn(async move {
                health::start(status, &options, started_tx, std::future::pending()).await
            })
        };

        let health_address = await_started("health", started_rx, &mut health).await?;
        info!("Health server listening on {}", health_address);

        Ok(Self {
            status,
            health,
            health_address,
        })
    }

    /// Bind the webhook server, then raise both flags
    async fn webhook(
        self,
        provider: Arc<dyn Provider>,
        options: &ServerOptions,
    ) -> Result<Serving> {
        let (started_tx, started_rx) = oneshot::channel();
        let mut webhook = {
            let options = options.clone();
            tokio::spawn(async move {
                webhook::start(provider, &options, started_tx, std::future::pending()).await
            })
        };

        let webhook_address = await_started("webhook", started_rx, &mut webhook).await?;
        info!("Webhook server listening on {}", webhook_address);

        self.status.set_healthy(true);
        self.status.set_ready(true);

        Ok(Serving {
            status: self.status,
            health: self.health,
            health_address: self.health_address,
            webhook,
            webhook_address,
        })
    }
}

/// Both servers listening with the flags raised
struct Serving {
    status: Arc<HealthStatus>,
    health: ServerTask,
    health_address: SocketAddr,
    webhook: ServerTask,
    webhook_address: SocketAddr,
}

impl Serving {
    /// Serve until `stop` resolves or a server exits, then lower both flags
    ///
    /// Requests still in flight are neither awaited nor cancelled here; they
    /// end with the runtime.
    async fn until<S>(mut self, stop: S) -> std::result::Result<(), Failure>
    where
        S: Future<Output = Result<&'static str>>,
    {
        let outcome = tokio::select! {
            signal = stop => match signal {
                Ok(name) => {
                    info!("Received shutdown signal: {}", name);
                    Ok(())
                }
                Err(e) => Err(Failure::Runtime(e)),
            },
            result = &mut self.webhook => Err(Failure::Runtime(unexpected_exit("webhook", result))),
            result = &mut self.health => Err(Failure::Runtime(unexpected_exit("health", result))),
        };

        self.status.set_ready(false);
        self.status.set_healthy(false);
        info!(
            "Shutting down (webhook {}, health {})",
            self.webhook_address, self.health_address
        );

        outcome
    }
}

/// Build the resolver client and provider from configuration
fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn Provider>> {
    let domain_filter =
        DomainFilter::build(&config.domain_filter_spec()).context("Invalid domain filter")?;

    let client =
        UnboundControlClient::new(config).context("Failed to create unbound-control client")?;
    info!(
        "Using unbound-control at {} (tls: {})",
        client.address(),
        config.uses_tls()
    );

    let provider = UnboundProvider::new(
        Box::new(client),
        domain_filter,
        EngineSettings {
            dry_run: config.dry_run,
            default_ttl: config.default_ttl,
        },
    );
    Ok(Arc::new(provider))
}

/// Wait for a server's bound address, or surface why it never came up
async fn await_started(
    name: &str,
    started: oneshot::Receiver<SocketAddr>,
    server: &mut JoinHandle<unbound_webhook_core::Result<()>>,
) -> Result<SocketAddr> {
    match started.await {
        Ok(address) => Ok(address),
        Err(_) => match server.await {
            Ok(Err(e)) => Err(anyhow!("{} server failed to start: {}", name, e)),
            Ok(Ok(())) => Err(anyhow!("{} server exited before starting", name)),
            Err(e) => Err(anyhow!("{} server task failed: {}", name, e)),
        },
    }
}

fn unexpected_exit(
    name: &str,
    result: std::result::Result<unbound_webhook_core::Result<()>, tokio::task::JoinError>,
) -> anyhow::Error {
    match result {
        Ok(Ok(())) => anyhow!("{} server stopped unexpectedly", name),
        Ok(Err(e)) => anyhow!("{} server failed: {}", name, e),
        Err(e) => anyhow!("{} server task failed: {}", name, e),
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
