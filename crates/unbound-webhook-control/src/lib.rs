// # unbound-control Client
//
// This crate implements the resolver capability over Unbound's remote
// control channel (`unbound-control`).
//
// ## Transport
//
// - **TLS**: when CA, certificate and key paths are all configured
// - **Plain TCP**: `control-use-cert: no` on the Unbound side
// - **Unix socket**: when the host is an absolute path
//
// One connection per command: the client writes `UBCT1 <command>\n` and
// reads until the server closes. No connection is opened at construction.
//
// ## Record Removal
//
// `local_data_remove` drops every record of a name. Removing a single
// (name, type, value) therefore lists the name first, removes it and adds
// back the records that were not the target.
//
// ## Commands
//
// - `list_local_data`
// - `local_data <name> <ttl> IN <type> <value>`
// - `local_data_remove <name>`

pub mod protocol;
pub mod tls;

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use unbound_webhook_core::config::ProviderConfig;
use unbound_webhook_core::record::{ResourceRecord, same_name};
use unbound_webhook_core::traits::ResolverClient;
use unbound_webhook_core::{Error, Result};

/// Default unbound-control port
pub const DEFAULT_PORT: u16 = 8953;

/// Upper bound for a single command exchange
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the control channel lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAddress {
    /// `host:port`
    Tcp(String),
    /// Unix domain socket path
    Unix(PathBuf),
}

impl ControlAddress {
    /// Interpret the configured host
    ///
    /// Absolute paths are unix sockets; a missing port defaults to 8953.
    pub fn parse(host: &str) -> Self {
        let host = host.trim();
        if host.starts_with('/') {
            return ControlAddress::Unix(PathBuf::from(host));
        }

        let address = if let Some(bracketed) = host.strip_prefix('[') {
            if bracketed.contains("]:") {
                host.to_string()
            } else {
                format!("{}:{}", host, DEFAULT_PORT)
            }
        } else {
            match host.matches(':').count() {
                0 => format!("{}:{}", host, DEFAULT_PORT),
                1 => host.to_string(),
                _ => format!("[{}]:{}", host, DEFAULT_PORT),
            }
        };
        ControlAddress::Tcp(address)
    }
}

impl std::fmt::Display for ControlAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlAddress::Tcp(address) => f.write_str(address),
            ControlAddress::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

/// Resolver client speaking the unbound-control protocol
pub struct UnboundControlClient {
    address: ControlAddress,
    tls: Option<TlsConnector>,
    timeout: Duration,
}

impl std::fmt::Debug for UnboundControlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnboundControlClient")
            .field("address", &self.address)
            .field("tls", &self.tls.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl UnboundControlClient {
    /// Create a client from the provider configuration
    ///
    /// TLS material is loaded here so a bad path fails at startup; the
    /// resolver itself is not contacted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the TLS paths are incomplete or cannot
    /// be loaded.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;

        let tls = match (&config.ca_pem_path, &config.cert_pem_path, &config.key_pem_path) {
            (Some(ca), Some(cert), Some(key)) => Some(tls::connector(ca, cert, key)?),
            _ => None,
        };

        let address = ControlAddress::parse(&config.host);
        tracing::debug!(
            "unbound-control client for {} (tls: {})",
            address,
            tls.is_some()
        );

        Ok(Self {
            address,
            tls,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Override the per-command timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> &ControlAddress {
        &self.address
    }

    /// Send one command and return the raw reply
    pub async fn command(&self, command: &str) -> Result<String> {
        tracing::trace!("unbound-control: {}", command);

        tokio::time::timeout(self.timeout, self.exchange(command))
            .await
            .map_err(|_| {
                Error::resolver(format!(
                    "unbound-control at {} timed out after {:?}",
                    self.address, self.timeout
                ))
            })?
    }

    async fn exchange(&self, command: &str) -> Result<String> {
        let framed = protocol::frame(command);

        let reply = match &self.address {
            ControlAddress::Tcp(address) => {
                let stream = TcpStream::connect(address.as_str()).await?;
                match &self.tls {
                    Some(connector) => {
                        let stream = connector.connect(tls::server_name()?, stream).await?;
                        round_trip(stream, &framed).await?
                    }
                    None => round_trip(stream, &framed).await?,
                }
            }
            #[cfg(unix)]
            ControlAddress::Unix(path) => {
                let stream = tokio::net::UnixStream::connect(path).await?;
                round_trip(stream, &framed).await?
            }
            #[cfg(not(unix))]
            ControlAddress::Unix(path) => {
                return Err(Error::config(format!(
                    "Unix sockets are not supported on this platform: {}",
                    path.display()
                )));
            }
        };

        protocol::decode_reply(reply)
    }

    async fn mutate(&self, command: &str) -> Result<()> {
        let reply = self.command(command).await?;
        protocol::check_reply(&reply)
    }
}

/// Write the framed command and read until the peer closes
async fn round_trip<S>(mut stream: S, framed: &str) -> std::io::Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(framed.as_bytes()).await?;
    stream.flush().await?;

    let mut reply = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => reply.extend_from_slice(&buf[..n]),
            // Unbound closes TLS sessions without close_notify
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
    }

    Ok(reply)
}

#[async_trait]
impl ResolverClient for UnboundControlClient {
    async fn list(&self) -> Result<Vec<ResourceRecord>> {
        let reply = self.command(protocol::list_command()).await?;
        protocol::parse_local_data(&reply)
    }

    async fn add(&self, rr: &ResourceRecord) -> Result<()> {
        self.mutate(&protocol::add_command(rr)).await
    }

    async fn remove(&self, rr: &ResourceRecord) -> Result<()> {
        let siblings: Vec<ResourceRecord> = self
            .list()
            .await?
            .into_iter()
            .filter(|existing| same_name(&existing.name, &rr.name))
            .collect();

        if !siblings.iter().any(|existing| existing.same_record(rr)) {
            tracing::debug!("Record {} not present, nothing to remove", rr);
            return Ok(());
        }

        self.mutate(&protocol::remove_command(&rr.name)).await?;

        for sibling in siblings.iter().filter(|existing| !existing.same_record(rr)) {
            self.mutate(&protocol::add_command(sibling)).await?;
        }
        Ok(())
    }

    fn client_name(&self) -> &'static str {
        "unbound-control"
    }
}
