//! Protocol constants: verb keys, purposes, device statuses, bio names.
//!
//! Verb keys are the first three tokens of the request line joined by
//! single spaces ("<VERB> <path> HTTP") and are compared case-sensitively.

/// SBI spec version reported in every response envelope.
pub const SPEC_VERSION: &str = "0.9.5";

// Verb keys.
pub const VERB_DISCOVER: &str = "MOSIPDISC /device HTTP";
pub const VERB_DEVICE_INFO: &str = "MOSIPDINFO /info HTTP";
pub const VERB_CAPTURE: &str = "CAPTURE /capture HTTP";
pub const VERB_RCAPTURE: &str = "RCAPTURE /capture HTTP";
pub const VERB_STREAM: &str = "STREAM /stream HTTP";
pub const VERB_ADMIN_STATUS: &str = "POST /admin/status HTTP";
pub const VERB_ADMIN_SCORE: &str = "POST /admin/score HTTP";
pub const VERB_ADMIN_DELAY: &str = "POST /admin/delay HTTP";
pub const VERB_ADMIN_PROFILE: &str = "POST /admin/profile HTTP";

// Purposes.
pub const PURPOSE_REGISTRATION: &str = "Registration";
pub const PURPOSE_AUTH: &str = "Auth";

// Biometric type labels as they appear on the wire.
pub const TYPE_BIOMETRIC_DEVICE: &str = "Biometric Device";
pub const TYPE_FINGER: &str = "Finger";
pub const TYPE_FACE: &str = "Face";
pub const TYPE_IRIS: &str = "Iris";

// Device sub-type labels.
pub const SUBTYPE_FINGER_SLAP: &str = "Slap";
pub const SUBTYPE_FINGER_SINGLE: &str = "Single";
pub const SUBTYPE_IRIS_DOUBLE: &str = "Double";
pub const SUBTYPE_IRIS_SINGLE: &str = "Single";
pub const SUBTYPE_FACE: &str = "Full face";

// Device statuses.
pub const DEVICE_STATUS_READY: &str = "Ready";
pub const DEVICE_STATUS_BUSY: &str = "Busy";
pub const DEVICE_STATUS_NOT_READY: &str = "Not Ready";
pub const DEVICE_STATUS_NOT_REGISTERED: &str = "Not Registered";

// Image formats for canned samples.
pub const IMAGE_TYPE_JP2000: &str = "JP2000";
pub const IMAGE_TYPE_WSQ: &str = "WSQ";

// Profiles.
pub const PROFILE_DEFAULT: &str = "Default";
pub const PROFILE_AUTOMATIC: &str = "Automatic";

// Sub-device ids. Slap and double-iris devices expose selectable
// sub-devices; single-capture devices use 0.
pub const SUB_DEVICE_FINGER_SLAP_LEFT: i32 = 1;
pub const SUB_DEVICE_FINGER_SLAP_RIGHT: i32 = 2;
pub const SUB_DEVICE_FINGER_SLAP_THUMBS: i32 = 3;
pub const SUB_DEVICE_IRIS_LEFT: i32 = 1;
pub const SUB_DEVICE_IRIS_RIGHT: i32 = 2;
pub const SUB_DEVICE_IRIS_BOTH: i32 = 3;
pub const SUB_DEVICE_SINGLE: i32 = 0;

// Bio-subtype names, matched case-sensitively against exception lists.
pub const BIO_NAME_UNKNOWN: &str = "UNKNOWN";
pub const BIO_NAME_LEFT_INDEX: &str = "Left IndexFinger";
pub const BIO_NAME_LEFT_MIDDLE: &str = "Left MiddleFinger";
pub const BIO_NAME_LEFT_RING: &str = "Left RingFinger";
pub const BIO_NAME_LEFT_LITTLE: &str = "Left LittleFinger";
pub const BIO_NAME_LEFT_THUMB: &str = "Left Thumb";
pub const BIO_NAME_RIGHT_INDEX: &str = "Right IndexFinger";
pub const BIO_NAME_RIGHT_MIDDLE: &str = "Right MiddleFinger";
pub const BIO_NAME_RIGHT_RING: &str = "Right RingFinger";
pub const BIO_NAME_RIGHT_LITTLE: &str = "Right LittleFinger";
pub const BIO_NAME_RIGHT_THUMB: &str = "Right Thumb";
pub const BIO_NAME_LEFT_IRIS: &str = "Left";
pub const BIO_NAME_RIGHT_IRIS: &str = "Right";

// Admin endpoint names checked against the configured allow-list.
pub const ADMIN_STATUS: &str = "status";
pub const ADMIN_SCORE: &str = "score";
pub const ADMIN_DELAY: &str = "delay";
pub const ADMIN_PROFILE: &str = "profile";
