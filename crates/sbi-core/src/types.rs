//! Startup-selected enumerations: purpose, biometric type, image format.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{SbiError, SbiResult};

/// What the simulated devices are used for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Purpose {
    Registration,
    Auth,
}

impl Purpose {
    pub fn as_str(self) -> &'static str {
        match self {
            Purpose::Registration => constants::PURPOSE_REGISTRATION,
            Purpose::Auth => constants::PURPOSE_AUTH,
        }
    }
}

impl FromStr for Purpose {
    type Err = SbiError;

    fn from_str(value: &str) -> SbiResult<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case(constants::PURPOSE_REGISTRATION) {
            Ok(Purpose::Registration)
        } else if value.eq_ignore_ascii_case(constants::PURPOSE_AUTH) {
            Ok(Purpose::Auth)
        } else {
            Err(SbiError::config(format!("invalid purpose: {value:?}")))
        }
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which device helpers a service instantiates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BiometricType {
    /// The composite device: every family is instantiated.
    BiometricDevice,
    Finger,
    Face,
    Iris,
}

impl BiometricType {
    pub fn as_str(self) -> &'static str {
        match self {
            BiometricType::BiometricDevice => constants::TYPE_BIOMETRIC_DEVICE,
            BiometricType::Finger => constants::TYPE_FINGER,
            BiometricType::Face => constants::TYPE_FACE,
            BiometricType::Iris => constants::TYPE_IRIS,
        }
    }
}

impl FromStr for BiometricType {
    type Err = SbiError;

    fn from_str(value: &str) -> SbiResult<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case(constants::TYPE_BIOMETRIC_DEVICE) {
            Ok(BiometricType::BiometricDevice)
        } else if value.eq_ignore_ascii_case(constants::TYPE_FINGER) {
            Ok(BiometricType::Finger)
        } else if value.eq_ignore_ascii_case(constants::TYPE_FACE) {
            Ok(BiometricType::Face)
        } else if value.eq_ignore_ascii_case(constants::TYPE_IRIS) {
            Ok(BiometricType::Iris)
        } else {
            Err(SbiError::config(format!("invalid biometric type: {value:?}")))
        }
    }
}

impl fmt::Display for BiometricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoding of the canned biometric samples served from profile folders.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jp2000,
    Wsq,
}

impl ImageFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageFormat::Jp2000 => constants::IMAGE_TYPE_JP2000,
            ImageFormat::Wsq => constants::IMAGE_TYPE_WSQ,
        }
    }
}

impl FromStr for ImageFormat {
    type Err = SbiError;

    fn from_str(value: &str) -> SbiResult<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case(constants::IMAGE_TYPE_JP2000) {
            Ok(ImageFormat::Jp2000)
        } else if value.eq_ignore_ascii_case(constants::IMAGE_TYPE_WSQ) {
            Ok(ImageFormat::Wsq)
        } else {
            Err(SbiError::config(format!("invalid image type: {value:?}")))
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validate the startup combination. WSQ is an auth-only fingerprint
/// format; registration devices must serve JP2000.
pub fn validate_startup(purpose: Purpose, image_format: ImageFormat) -> SbiResult<()> {
    if purpose == Purpose::Registration && image_format == ImageFormat::Wsq {
        return Err(SbiError::config(
            "WSQ samples cannot be served by a Registration device",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_is_case_insensitive() {
        assert_eq!("registration".parse::<Purpose>().unwrap(), Purpose::Registration);
        assert_eq!("AUTH".parse::<Purpose>().unwrap(), Purpose::Auth);
        assert_eq!(
            "biometric device".parse::<BiometricType>().unwrap(),
            BiometricType::BiometricDevice
        );
        assert_eq!("wsq".parse::<ImageFormat>().unwrap(), ImageFormat::Wsq);
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!("Palm".parse::<BiometricType>().is_err());
        assert!("".parse::<Purpose>().is_err());
        assert!("JPEG".parse::<ImageFormat>().is_err());
    }

    #[test]
    fn registration_wsq_is_invalid() {
        assert!(validate_startup(Purpose::Registration, ImageFormat::Wsq).is_err());
        assert!(validate_startup(Purpose::Registration, ImageFormat::Jp2000).is_ok());
        assert!(validate_startup(Purpose::Auth, ImageFormat::Wsq).is_ok());
    }
}
