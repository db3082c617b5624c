//! Core types for the mock SBI (Standard Biometric Interface) device service.
//!
//! This crate carries everything the device layer and the network service
//! share: protocol constants, the error type, configuration loading, the
//! wire DTOs, the locale-keyed error-message catalog, and the small
//! hashing/encoding/signing helpers used when assembling responses.

pub mod catalog;
pub mod constants;
pub mod dto;
pub mod error;
pub mod settings;
pub mod sign;
pub mod types;
pub mod util;

pub use error::{SbiError, SbiResult};
pub use settings::Settings;
pub use sign::Signer;
pub use types::{BiometricType, ImageFormat, Purpose};
