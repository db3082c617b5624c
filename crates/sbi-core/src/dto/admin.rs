//! Admin endpoint request DTOs.

use serde::Deserialize;

use super::lenient_opt_i64;

/// POST /admin/status — override the advertised device status.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusRequest {
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub device_status: Option<String>,
}

/// POST /admin/score — override the captured quality score.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreRequest {
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub quality_score: Option<i64>,
    pub from_iso: bool,
}

/// POST /admin/delay — inject latency before responding to given verbs.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DelayRequest {
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub delay: Option<i64>,
    /// Verbs to delay; absent means every verb.
    pub method: Option<Vec<String>>,
}

/// POST /admin/profile — switch the active sample profile.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileRequest {
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub profile_id: Option<String>,
}
