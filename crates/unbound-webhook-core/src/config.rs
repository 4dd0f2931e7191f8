//! Configuration types for the Unbound webhook
//!
//! All configuration comes from environment variables. Each struct has a
//! `from_env()` constructor and a `from_lookup()` variant that takes any
//! `Fn(&str) -> Option<String>`, which is what tests use instead of touching
//! the process environment.

use crate::domain_filter::DomainFilterSpec;
use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Provider (resolver side) configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Unbound control endpoint: `host`, `host:port` or a unix socket path
    pub host: String,

    /// Server certificate used as trust anchor (`unbound_server.pem`)
    pub ca_pem_path: Option<PathBuf>,

    /// Control client private key (`unbound_control.key`)
    pub key_pem_path: Option<PathBuf>,

    /// Control client certificate (`unbound_control.pem`)
    pub cert_pem_path: Option<PathBuf>,

    /// Log operations without touching the resolver
    pub dry_run: bool,

    /// TTL for endpoints that carry none
    pub default_ttl: u32,

    /// Plain include domains
    pub domain_filter: Vec<String>,

    /// Plain exclude domains
    pub exclude_domains: Vec<String>,

    /// Regex include pattern; takes precedence over the plain lists when set
    pub regex_domain_filter: String,

    /// Regex exclude pattern
    pub regex_domain_exclusion: String,
}

impl ProviderConfig {
    /// Create a configuration for `host` with defaults everywhere else
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ca_pem_path: None,
            key_pem_path: None,
            cert_pem_path: None,
            dry_run: false,
            default_ttl: default_ttl(),
            domain_filter: Vec::new(),
            exclude_domains: Vec::new(),
            regex_domain_filter: String::new(),
            regex_domain_exclusion: String::new(),
        }
    }

    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup
    ///
    /// # Variables
    ///
    /// - `UNBOUND_HOST` (required)
    /// - `UNBOUND_CA_PEM_PATH`, `UNBOUND_KEY_PEM_PATH`, `UNBOUND_CERT_PEM_PATH`
    /// - `DRY_RUN` (default `false`)
    /// - `DEFAULT_TTL` (default `300`)
    /// - `DOMAIN_FILTER`, `EXCLUDE_DOMAIN_FILTER` (comma-separated)
    /// - `REGEXP_DOMAIN_FILTER`, `REGEXP_DOMAIN_FILTER_EXCLUSION`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = var("UNBOUND_HOST").ok_or_else(|| {
            Error::config(
                "UNBOUND_HOST is required. \
                Set it via: export UNBOUND_HOST=127.0.0.1:8953",
            )
        })?;

        let config = Self {
            host,
            ca_pem_path: var("UNBOUND_CA_PEM_PATH").map(PathBuf::from),
            key_pem_path: var("UNBOUND_KEY_PEM_PATH").map(PathBuf::from),
            cert_pem_path: var("UNBOUND_CERT_PEM_PATH").map(PathBuf::from),
            dry_run: var("DRY_RUN")
                .map(|v| parse_bool("DRY_RUN", &v))
                .transpose()?
                .unwrap_or(false),
            default_ttl: var("DEFAULT_TTL")
                .map(|v| parse_number("DEFAULT_TTL", &v))
                .transpose()?
                .unwrap_or_else(default_ttl),
            domain_filter: var("DOMAIN_FILTER").map(|v| parse_list(&v)).unwrap_or_default(),
            exclude_domains: var("EXCLUDE_DOMAIN_FILTER")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            regex_domain_filter: var("REGEXP_DOMAIN_FILTER").unwrap_or_default(),
            regex_domain_exclusion: var("REGEXP_DOMAIN_FILTER_EXCLUSION").unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::config("UNBOUND_HOST cannot be empty"));
        }

        let tls_paths = [&self.ca_pem_path, &self.key_pem_path, &self.cert_pem_path];
        let configured = tls_paths.iter().filter(|p| p.is_some()).count();
        if configured != 0 && configured != tls_paths.len() {
            return Err(Error::config(
                "UNBOUND_CA_PEM_PATH, UNBOUND_KEY_PEM_PATH and UNBOUND_CERT_PEM_PATH \
                must be set together",
            ));
        }

        Ok(())
    }

    /// Whether the control channel uses TLS
    pub fn uses_tls(&self) -> bool {
        self.ca_pem_path.is_some()
    }

    /// Domain filter selection for this configuration
    pub fn domain_filter_spec(&self) -> DomainFilterSpec {
        DomainFilterSpec::from_parts(
            self.domain_filter.clone(),
            self.exclude_domains.clone(),
            self.regex_domain_filter.clone(),
            self.regex_domain_exclusion.clone(),
        )
    }
}

/// HTTP listener configuration for the webhook and health servers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    pub webhook_host: String,

    pub webhook_port: u16,

    pub health_host: String,

    pub health_port: u16,

    /// Request read timeout in milliseconds
    pub read_timeout_ms: u64,

    /// Response write timeout in milliseconds
    pub write_timeout_ms: u64,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            webhook_host: "localhost".to_string(),
            webhook_port: 8888,
            health_host: "0.0.0.0".to_string(),
            health_port: 8080,
            read_timeout_ms: 60_000,
            write_timeout_ms: 60_000,
        }
    }
}

impl ServerOptions {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable lookup
    ///
    /// Reads `WEBHOOK_HOST`, `WEBHOOK_PORT`, `HEALTH_HOST`, `HEALTH_PORT`,
    /// `READ_TIMEOUT` and `WRITE_TIMEOUT` (milliseconds).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Ok(Self {
            webhook_host: var("WEBHOOK_HOST").unwrap_or(defaults.webhook_host),
            webhook_port: var("WEBHOOK_PORT")
                .map(|v| parse_number("WEBHOOK_PORT", &v))
                .transpose()?
                .unwrap_or(defaults.webhook_port),
            health_host: var("HEALTH_HOST").unwrap_or(defaults.health_host),
            health_port: var("HEALTH_PORT")
                .map(|v| parse_number("HEALTH_PORT", &v))
                .transpose()?
                .unwrap_or(defaults.health_port),
            read_timeout_ms: var("READ_TIMEOUT")
                .map(|v| parse_number("READ_TIMEOUT", &v))
                .transpose()?
                .unwrap_or(defaults.read_timeout_ms),
            write_timeout_ms: var("WRITE_TIMEOUT")
                .map(|v| parse_number("WRITE_TIMEOUT", &v))
                .transpose()?
                .unwrap_or(defaults.write_timeout_ms),
        })
    }

    /// `host:port` the webhook listens on
    pub fn webhook_address(&self) -> String {
        format!("{}:{}", self.webhook_host, self.webhook_port)
    }

    /// `host:port` the health server listens on
    pub fn health_address(&self) -> String {
        format!("{}:{}", self.health_host, self.health_port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Upper bound for a whole request/response exchange
    pub fn request_timeout(&self) -> Duration {
        self.read_timeout().max(self.write_timeout())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "on" => Ok(true),
        "0" | "f" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(format!(
            "{} must be a boolean (true/false). Got: {}",
            key, value
        ))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::config(format!("{} must be a non-negative integer. Got: {}", key, value)))
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn default_ttl() -> u32 {
    300
}
