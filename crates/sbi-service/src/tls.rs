//! TLS acceptor construction from PEM keystore material.

use std::path::Path;
use std::sync::Arc;

use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

use sbi_core::{SbiError, SbiResult};

/// Build a TLS acceptor for the listening socket from PEM cert/key files.
pub fn build_acceptor(cert_path: &Path, key_path: &Path) -> SbiResult<TlsAcceptor> {
    let cert_pem = std::fs::read(cert_path)
        .map_err(|e| SbiError::Keystore(format!("cannot read {}: {e}", cert_path.display())))?;
    let key_pem = std::fs::read(key_path)
        .map_err(|e| SbiError::Keystore(format!("cannot read {}: {e}", key_path.display())))?;

    let certs = CertificateDer::pem_slice_iter(&cert_pem)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SbiError::Keystore(format!("failed to parse certificates: {e:?}")))?;
    if certs.is_empty() {
        return Err(SbiError::Keystore(format!(
            "no certificates found in {}",
            cert_path.display()
        )));
    }
    let key = PrivateKeyDer::from_pem_slice(&key_pem)
        .map_err(|e| SbiError::Keystore(format!("failed to parse private key: {e:?}")))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| SbiError::Keystore(format!("invalid TLS identity: {e}")))?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}
