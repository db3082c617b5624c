//! Capture, discovery-request and stream DTOs.

use serde::{Deserialize, Serialize};

use super::device::ErrorInfo;
use super::{lenient_i64, lenient_opt_i64};

/// MOSIPDISC request body.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscoverRequest {
    #[serde(rename = "type")]
    pub device_type: Option<String>,
}

/// CAPTURE / RCAPTURE request envelope.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureRequest {
    pub env: Option<String>,
    pub purpose: Option<String>,
    pub spec_version: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub timeout: Option<i64>,
    pub domain_uri: Option<String>,
    pub capture_time: Option<String>,
    pub transaction_id: Option<String>,
    pub registration_id: Option<String>,
    pub bio: Vec<CaptureBioRequest>,
    pub custom_opts: Option<serde_json::Value>,
}

impl CaptureRequest {
    /// Validate the required envelope fields ahead of any device
    /// interaction. Returns the offending field name on failure.
    pub fn validate(&self, registration: bool) -> Result<(), &'static str> {
        fn blank(value: &Option<String>) -> bool {
            value.as_deref().map_or(true, |v| v.trim().is_empty())
        }

        if blank(&self.env) {
            return Err("env");
        }
        if blank(&self.purpose) {
            return Err("purpose");
        }
        if blank(&self.spec_version) {
            return Err("specVersion");
        }
        if self.timeout.map_or(true, |t| t <= 0) {
            return Err("timeout");
        }
        if blank(&self.capture_time) {
            return Err("captureTime");
        }
        // Registration captures carry a transaction id; auth captures may
        // use either id field.
        if registration {
            if blank(&self.transaction_id) {
                return Err("transactionId");
            }
        } else if blank(&self.transaction_id) && blank(&self.registration_id) {
            return Err("transactionId");
        }
        if self.bio.is_empty() {
            return Err("bio");
        }
        Ok(())
    }
}

/// One requested modality within a capture request.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureBioRequest {
    #[serde(rename = "type")]
    pub bio_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub count: Option<i64>,
    pub exception: Option<Vec<String>>,
    pub bio_sub_type: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub requested_score: Option<i64>,
    pub device_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub device_sub_id: Option<i64>,
    pub previous_hash: Option<String>,
}

/// One captured biometric in a capture response: a signed data block plus
/// its position in the hash chain.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BiometricDto {
    pub spec_version: String,
    pub data: String,
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

/// The signed payload inside [`BiometricDto::data`].
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BiometricDataDto {
    pub digital_id: String,
    pub device_code: String,
    pub device_service_version: String,
    pub bio_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio_sub_type: Option<String>,
    pub purpose: String,
    pub env: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub timestamp: String,
    pub requested_score: String,
    pub quality_score: String,
}

/// CAPTURE / RCAPTURE response body.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResponse {
    pub biometrics: Vec<BiometricDto>,
}

/// STREAM request body.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamRequest {
    pub device_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub device_sub_id: i64,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub timeout: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CaptureRequest {
        serde_json::from_str(
            r#"{
                "env": "Developer",
                "purpose": "Registration",
                "specVersion": "0.9.5",
                "timeout": "10000",
                "captureTime": "2026-01-01T00:00:00.000Z",
                "transactionId": "txn-0001",
                "bio": [{
                    "type": "Finger",
                    "count": "4",
                    "exception": ["Left Thumb"],
                    "requestedScore": "40",
                    "deviceId": "FS001",
                    "deviceSubId": "1",
                    "previousHash": ""
                }]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn lenient_fields_accept_quoted_numbers() {
        let req = valid_request();
        assert_eq!(req.timeout, Some(10000));
        assert_eq!(req.bio[0].device_sub_id, Some(1));
        assert_eq!(req.bio[0].requested_score, Some(40));
    }

    #[test]
    fn valid_request_passes_validation() {
        assert!(valid_request().validate(true).is_ok());
    }

    #[test]
    fn blank_required_fields_are_named() {
        let mut req = valid_request();
        req.env = Some("   ".into());
        assert_eq!(req.validate(true), Err("env"));

        let mut req = valid_request();
        req.timeout = None;
        assert_eq!(req.validate(true), Err("timeout"));

        let mut req = valid_request();
        req.bio.clear();
        assert_eq!(req.validate(true), Err("bio"));
    }

    #[test]
    fn auth_accepts_registration_id_in_place_of_transaction_id() {
        let mut req = valid_request();
        req.transaction_id = None;
        req.registration_id = Some("reg-1".into());
        assert!(req.validate(false).is_ok());
        assert_eq!(req.validate(true), Err("transactionId"));
    }

    #[test]
    fn biometric_dto_omits_absent_optionals() {
        let dto = BiometricDto {
            spec_version: "0.9.5".into(),
            data: "payload".into(),
            hash: "ff".into(),
            ..Default::default()
        };
        let json = serde_json::to_string(&dto).unwrap();
        assert!(!json.contains("sessionKey"));
        assert!(!json.contains("error"));
    }
}
