//! Error types for the mock SBI service.
//!
//! `SbiError` consolidates every failure the service layers can produce:
//! socket and file I/O, JSON (de)serialization, configuration problems,
//! keystore/signing failures, and codec collaborator errors. Protocol-level
//! failures (bad verb, truncated body) never unwind past the worker; they
//! are converted into framed 405 responses at that boundary.

use thiserror::Error;

/// Convenience alias for results using the service error type.
pub type SbiResult<T> = std::result::Result<T, SbiError>;

/// Primary error type for the mock SBI service.
#[derive(Error, Debug)]
pub enum SbiError {
    /// File or socket I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Semantic configuration error (invalid purpose/type/format combination,
    /// bad port range, missing required setting).
    #[error("configuration error: {0}")]
    Config(String),

    /// Keystore material could not be loaded or used for signing.
    #[error("keystore error: {0}")]
    Keystore(String),

    /// The biometric codec collaborator failed.
    #[error("codec error ({modality}): {message}")]
    Codec { modality: String, message: String },

    /// Malformed or truncated request on the wire.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Device-level failure (unknown device, invalid state transition).
    #[error("device error: {0}")]
    Device(String),
}

impl SbiError {
    pub fn config(msg: impl Into<String>) -> Self {
        SbiError::Config(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        SbiError::Protocol(msg.into())
    }

    pub fn device(msg: impl Into<String>) -> Self {
        SbiError::Device(msg.into())
    }

    pub fn codec(modality: impl Into<String>, message: impl Into<String>) -> Self {
        SbiError::Codec {
            modality: modality.into(),
            message: message.into(),
        }
    }
}
