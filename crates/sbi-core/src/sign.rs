//! JWS signing of response payloads.
//!
//! Device-info blocks and biometric data blocks are wrapped in an RS256 JWS
//! whose header carries the signing certificate (`x5c`), so clients can
//! verify provenance. When no keystore is configured the service falls back
//! to emitting the bare payload base64url-encoded; test clients that do not
//! verify signatures accept both shapes.

use std::path::Path;

use jsonwebtoken::{Algorithm, EncodingKey, Header};

use crate::error::{SbiError, SbiResult};
use crate::util::base64_url_encode;

/// Signs JSON payloads for response envelopes.
#[derive(Clone)]
pub enum Signer {
    /// RS256 JWS with the certificate chain in the header.
    Jws(JwsSigner),
    /// No keystore configured: payloads are encoded but not signed.
    Unsigned,
}

impl Signer {
    /// Build a signer from PEM key/cert paths; `None` paths yield the
    /// unsigned fallback.
    pub fn from_keystore(
        key_path: Option<&Path>,
        cert_path: Option<&Path>,
    ) -> SbiResult<Self> {
        match (key_path, cert_path) {
            (Some(key), Some(cert)) => Ok(Signer::Jws(JwsSigner::from_pem_files(key, cert)?)),
            (None, None) => Ok(Signer::Unsigned),
            _ => Err(SbiError::Keystore(
                "signing requires both signing_key_path and signing_cert_path".to_string(),
            )),
        }
    }

    /// Produce the wire form of a JSON payload.
    pub fn sign(&self, payload: &[u8]) -> SbiResult<String> {
        match self {
            Signer::Jws(signer) => signer.sign(payload),
            Signer::Unsigned => Ok(base64_url_encode(payload)),
        }
    }
}

#[derive(Clone)]
pub struct JwsSigner {
    key: EncodingKey,
    x5c: Vec<String>,
}

impl JwsSigner {
    pub fn from_pem_files(key_path: &Path, cert_path: &Path) -> SbiResult<Self> {
        let key_pem = std::fs::read(key_path).map_err(|e| {
            SbiError::Keystore(format!("cannot read {}: {e}", key_path.display()))
        })?;
        let cert_pem = std::fs::read_to_string(cert_path).map_err(|e| {
            SbiError::Keystore(format!("cannot read {}: {e}", cert_path.display()))
        })?;

        let key = EncodingKey::from_rsa_pem(&key_pem)
            .map_err(|e| SbiError::Keystore(format!("invalid RSA key: {e}")))?;
        let x5c = pem_certificates(&cert_pem);
        if x5c.is_empty() {
            return Err(SbiError::Keystore(format!(
                "no certificates found in {}",
                cert_path.display()
            )));
        }

        Ok(Self { key, x5c })
    }

    pub fn sign(&self, payload: &[u8]) -> SbiResult<String> {
        let claims: serde_json::Value = serde_json::from_slice(payload)?;
        let mut header = Header::new(Algorithm::RS256);
        header.x5c = Some(self.x5c.clone());
        jsonwebtoken::encode(&header, &claims, &self.key)
            .map_err(|e| SbiError::Keystore(format!("JWS signing failed: {e}")))
    }
}

/// Extract base64 DER blocks from a PEM certificate bundle for the JWS
/// `x5c` header.
fn pem_certificates(pem: &str) -> Vec<String> {
    let mut certs = Vec::new();
    let mut current: Option<String> = None;
    for line in pem.lines() {
        let line = line.trim();
        if line == "-----BEGIN CERTIFICATE-----" {
            current = Some(String::new());
        } else if line == "-----END CERTIFICATE-----" {
            if let Some(der) = current.take() {
                certs.push(der);
            }
        } else if let Some(der) = current.as_mut() {
            der.push_str(line);
        }
    }
    certs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsigned_signer_encodes_payload() {
        let signer = Signer::Unsigned;
        let signed = signer.sign(br#"{"a":1}"#).unwrap();
        assert_eq!(
            crate::util::base64_url_decode(&signed).unwrap(),
            br#"{"a":1}"#
        );
    }

    #[test]
    fn half_configured_keystore_is_rejected() {
        let err = Signer::from_keystore(Some(Path::new("key.pem")), None);
        assert!(err.is_err());
    }

    #[test]
    fn pem_certificate_extraction() {
        let pem = "-----BEGIN CERTIFICATE-----\nQUJD\nREVG\n-----END CERTIFICATE-----\n\
                   -----BEGIN CERTIFICATE-----\nR0hJ\n-----END CERTIFICATE-----\n";
        let certs = pem_certificates(pem);
        assert_eq!(certs, vec!["QUJDREVG".to_string(), "R0hJ".to_string()]);
    }

    #[test]
    fn empty_bundle_yields_no_certificates() {
        assert!(pem_certificates("not a certificate").is_empty());
    }
}
