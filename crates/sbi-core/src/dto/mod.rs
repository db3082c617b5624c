//! Wire DTOs for the pseudo-HTTP JSON protocol.
//!
//! Field names follow the wire (camelCase). Clients are inconsistent about
//! numeric fields — timeouts, scores and sub-device ids arrive as numbers
//! or as quoted strings — so those fields use lenient deserializers.

mod admin;
mod capture;
mod device;

pub use admin::{DelayRequest, ProfileRequest, ScoreRequest, StatusRequest};
pub use capture::{
    BiometricDataDto, BiometricDto, CaptureBioRequest, CaptureRequest, CaptureResponse,
    DiscoverRequest, StreamRequest,
};
pub use device::{DeviceInfo, DeviceInfoDto, DigitalId, DiscoverDto, ErrorInfo};

use serde::{Deserialize, Deserializer};

/// Envelope used to cross-check the JSON-declared method against the actual
/// transport verb before dispatch.
#[derive(Debug, Deserialize)]
pub struct MethodEnvelope {
    #[serde(default)]
    pub method: Option<String>,
}

/// Deserialize an integer that may arrive as a JSON number or string.
pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

pub(crate) fn lenient_opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
        None,
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None | Some(Raw::None) => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                trimmed
                    .parse()
                    .map(Some)
                    .map_err(serde::de::Error::custom)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "lenient_i64")]
        value: i64,
        #[serde(default, deserialize_with = "lenient_opt_i64")]
        maybe: Option<i64>,
    }

    #[test]
    fn numbers_and_strings_both_parse() {
        let a: Probe = serde_json::from_str(r#"{"value": 10000}"#).unwrap();
        assert_eq!(a.value, 10000);
        assert_eq!(a.maybe, None);

        let b: Probe = serde_json::from_str(r#"{"value": "10000", "maybe": "3"}"#).unwrap();
        assert_eq!(b.value, 10000);
        assert_eq!(b.maybe, Some(3));
    }

    #[test]
    fn junk_strings_are_rejected() {
        assert!(serde_json::from_str::<Probe>(r#"{"value": "ten"}"#).is_err());
    }
}
