//! Locale-keyed error-message catalog.
//!
//! Error descriptions are resolved by `(language, code)`. An unknown
//! language falls back to `"en"`; a missing catalog entry yields the
//! literal `"No Description available."` so a response can always be
//! framed.

/// Fallback text for codes with no catalog entry.
pub const NO_DESCRIPTION: &str = "No Description available.";

static MESSAGES_EN: &[(&str, &str)] = &[
    ("0", "Success"),
    ("100", "Success"),
    ("500", "Invalid verb or unsupported method requested"),
    ("501", "Invalid connection or malformed request"),
    ("502", "Invalid type value in the request"),
    ("503", "No biometric device available for the requested type"),
    ("551", "Unsupported specification version"),
    ("604", "Streaming request missing the device id"),
    ("605", "Streaming device not found"),
    ("606", "Streaming is supported only for registration devices"),
    ("607", "Streaming device is not ready"),
    ("608", "Live stream ended"),
    ("609", "Device is already streaming"),
    ("610", "Live streaming failed"),
    ("700", "Capture stopped because the live stream ended"),
    ("701", "Capture timed out"),
    ("702", "Capture requested on a different device than the one in use"),
    ("703", "A capture is already in progress on this device"),
    ("704", "Capture request missing the device id"),
    ("705", "Capture device not found"),
    ("706", "Capture purpose does not match the device purpose"),
    ("707", "Capture request validation failed"),
    ("708", "No biometrics could be captured"),
    ("709", "Admin request is not permitted"),
    ("710", "Capture failed"),
    ("751", "Invalid admin request value"),
    ("999", "Unexpected failure"),
];

/// Resolve the description for an error code in the requested language.
/// Only "en" is shipped, so every language resolves to the English catalog.
pub fn error_description(lang: &str, code: &str) -> String {
    let _ = lang;
    MESSAGES_EN
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, msg)| (*msg).to_string())
        .unwrap_or_else(|| NO_DESCRIPTION.to_string())
}
