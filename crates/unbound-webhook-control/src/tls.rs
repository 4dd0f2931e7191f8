//! Mutual TLS setup for the control channel
//!
//! Unbound's control certificates are generated by `unbound-control-setup`:
//! the server certificate doubles as the trust anchor and is issued for the
//! name `unbound`, which is the name we verify against regardless of the
//! address we dial.

use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName};
use rustls::{ClientConfig, RootCertStore};
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::TlsConnector;
use unbound_webhook_core::{Error, Result};

/// Name carried by Unbound's generated server certificate
pub const SERVER_NAME: &str = "unbound";

/// Build a connector from the trust anchor and the client key pair
///
/// # Errors
///
/// Returns [`Error::Config`] if a file is missing, holds no PEM item of the
/// expected kind, or the key does not fit the certificate.
pub fn connector(ca_path: &Path, cert_path: &Path, key_path: &Path) -> Result<TlsConnector> {
    let mut roots = RootCertStore::empty();
    for cert in load_certs(ca_path)? {
        roots.add(cert).map_err(|e| {
            Error::config(format!("Invalid CA certificate {}: {}", ca_path.display(), e))
        })?;
    }

    let chain = load_certs(cert_path)?;
    let key = PrivateKeyDer::from_pem_file(key_path).map_err(|e| {
        Error::config(format!("Cannot read private key {}: {}", key_path.display(), e))
    })?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::config(format!("TLS setup failed: {}", e)))?
        .with_root_certificates(roots)
        .with_client_auth_cert(chain, key)
        .map_err(|e| Error::config(format!("Invalid client certificate or key: {}", e)))?;

    Ok(TlsConnector::from(Arc::new(config)))
}

/// The name presented during the handshake
pub fn server_name() -> Result<ServerName<'static>> {
    ServerName::try_from(SERVER_NAME)
        .map_err(|e| Error::config(format!("Invalid TLS server name: {}", e)))
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let certs = CertificateDer::pem_file_iter(path)
        .map_err(|e| Error::config(format!("Cannot read certificate {}: {}", path.display(), e)))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::config(format!("Invalid certificate {}: {}", path.display(), e)))?;

    if certs.is_empty() {
        return Err(Error::config(format!(
            "No certificate found in {}",
            path.display()
        )));
    }
    Ok(certs)
}
