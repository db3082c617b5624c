//! Device identity and discovery DTOs.

use serde::{Deserialize, Serialize};

use crate::catalog::error_description;

/// Error envelope carried by discovery, info, admin and capture responses.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub error_code: String,
    pub error_info: String,
}

impl ErrorInfo {
    /// Build an error envelope resolving the description from the catalog.
    pub fn from_catalog(lang: &str, code: &str) -> Self {
        Self {
            error_code: code.to_string(),
            error_info: error_description(lang, code),
        }
    }

    /// Build an error envelope with extra detail appended to the catalog
    /// description.
    pub fn with_detail(lang: &str, code: &str, detail: &str) -> Self {
        Self {
            error_code: code.to_string(),
            error_info: format!("{} {}", error_description(lang, code), detail)
                .trim()
                .to_string(),
        }
    }
}

/// Immutable identity blob for one simulated device, loaded once per
/// helper and timestamped at load.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DigitalId {
    pub serial_no: String,
    pub make: String,
    pub model: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub device_sub_type: String,
    pub device_provider_id: String,
    pub device_provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
}

/// Full device description served by MOSIPDINFO.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceInfo {
    pub spec_version: Vec<String>,
    pub env: String,
    /// Signed (or base64url-encoded) digital id.
    pub digital_id: String,
    pub device_id: String,
    pub device_code: String,
    pub purpose: String,
    pub service_version: String,
    pub device_status: String,
    pub firmware: String,
    pub certification: String,
    pub device_sub_id: Vec<String>,
    pub callback_id: String,
}

/// Discovery entry served by MOSIPDISC, one per matching device helper.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscoverDto {
    pub device_id: String,
    pub device_status: String,
    pub certification: String,
    pub service_version: String,
    pub callback_id: String,
    /// Unsigned, base64url-encoded digital id.
    pub digital_id: String,
    pub device_code: String,
    pub purpose: String,
    pub spec_version: Vec<String>,
    pub device_sub_id: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl DiscoverDto {
    /// Discovery answer consisting solely of an error entry.
    pub fn error_entry(lang: &str, code: &str) -> Self {
        Self {
            error: Some(ErrorInfo::from_catalog(lang, code)),
            ..Default::default()
        }
    }
}

/// MOSIPDINFO entry: the signed device info plus an error envelope.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceInfoDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digital_id_wire_shape() {
        let id = DigitalId {
            serial_no: "FS001".into(),
            make: "MockMaker".into(),
            model: "SLAP01".into(),
            device_type: "Finger".into(),
            device_sub_type: "Slap".into(),
            device_provider_id: "MOCK.PROVIDER".into(),
            device_provider: "Mock Provider".into(),
            date_time: Some("2026-01-01T00:00:00.000Z".into()),
        };
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json["type"], "Finger");
        assert_eq!(json["serialNo"], "FS001");
        assert_eq!(json["deviceSubType"], "Slap");
    }

    #[test]
    fn discover_error_entry_omits_empty_fields() {
        let entry = DiscoverDto::error_entry("en", "502");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["error"]["errorCode"], "502");
        // Device fields serialize as empty strings, matching the original
        // wire shape for error-only entries.
        assert_eq!(json["deviceId"], "");
    }

    #[test]
    fn error_info_detail_is_trimmed() {
        let err = ErrorInfo::with_detail("en", "999", "");
        assert_eq!(err.error_info, "Unexpected failure");
        let err = ErrorInfo::with_detail("en", "999", "socket closed");
        assert_eq!(err.error_info, "Unexpected failure socket closed");
    }
}
