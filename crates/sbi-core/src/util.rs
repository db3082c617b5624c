//! Encoding, hashing and timestamp helpers.

use base64::alphabet;
use base64::engine::general_purpose::GeneralPurposeConfig;
use base64::engine::{DecodePaddingMode, GeneralPurpose};
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::error::{SbiError, SbiResult};

/// URL-safe base64, unpadded on encode, padding-indifferent on decode.
/// Biometric payloads and digital IDs travel in this encoding.
const BASE64_URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub fn base64_url_encode(data: &[u8]) -> String {
    BASE64_URL.encode(data)
}

pub fn base64_url_decode(data: &str) -> SbiResult<Vec<u8>> {
    BASE64_URL
        .decode(data)
        .map_err(|e| SbiError::protocol(format!("invalid base64url payload: {e}")))
}

/// Lowercase hex SHA-256 digest, the building block of the response hash
/// chain.
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Chain a data block onto the previous entry's hash. An empty previous
/// hash seeds the chain with the digest of the empty string.
pub fn chain_hash(previous_hash: &str, data_block: &[u8]) -> String {
    let previous = if previous_hash.trim().is_empty() {
        sha256_hex(b"")
    } else {
        previous_hash.trim().to_string()
    };
    let current = sha256_hex(data_block);
    sha256_hex(format!("{previous}{current}").as_bytes())
}

/// Current time as an ISO-8601 timestamp with millisecond precision, used
/// on digital IDs and biometric data blocks.
pub fn iso8601_timestamp() -> String {
    chrono::Utc::now()
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
}
