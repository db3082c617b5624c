//! Device family tables.
//!
//! A family is one concrete (biometric type, sub-type) device variant.
//! The tables here describe each variant as data: which slots a sub-device
//! captures, which sub-device ids exist, registry keys, and default
//! identity values.

use sbi_core::constants;
use sbi_core::types::BiometricType;

use crate::slot::SlotId;

const FINGER_SLAP_LEFT: &[SlotId] = &[
    SlotId::LeftIndex,
    SlotId::LeftMiddle,
    SlotId::LeftRing,
    SlotId::LeftLittle,
];
const FINGER_SLAP_RIGHT: &[SlotId] = &[
    SlotId::RightIndex,
    SlotId::RightMiddle,
    SlotId::RightRing,
    SlotId::RightLittle,
];
const FINGER_SLAP_THUMBS: &[SlotId] = &[SlotId::LeftThumb, SlotId::RightThumb];
const FINGER_ALL: &[SlotId] = &[
    SlotId::LeftIndex,
    SlotId::LeftMiddle,
    SlotId::LeftRing,
    SlotId::LeftLittle,
    SlotId::LeftThumb,
    SlotId::RightIndex,
    SlotId::RightMiddle,
    SlotId::RightRing,
    SlotId::RightLittle,
    SlotId::RightThumb,
];
const IRIS_LEFT: &[SlotId] = &[SlotId::LeftIris];
const IRIS_RIGHT: &[SlotId] = &[SlotId::RightIris];
const IRIS_BOTH: &[SlotId] = &[SlotId::LeftIris, SlotId::RightIris];
const FACE_ALL: &[SlotId] = &[SlotId::Face, SlotId::ExceptionPhoto];
const NO_SLOTS: &[SlotId] = &[];

/// One concrete simulated device variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceFamily {
    FingerSlap,
    FingerSingle,
    IrisDouble,
    IrisSingle,
    Face,
}

impl DeviceFamily {
    pub fn all() -> &'static [DeviceFamily] {
        &[
            DeviceFamily::FingerSlap,
            DeviceFamily::FingerSingle,
            DeviceFamily::IrisDouble,
            DeviceFamily::IrisSingle,
            DeviceFamily::Face,
        ]
    }

    /// Families instantiated for a configured biometric type. The composite
    /// "Biometric Device" type instantiates every family.
    pub fn for_biometric_type(biometric_type: BiometricType) -> &'static [DeviceFamily] {
        match biometric_type {
            BiometricType::BiometricDevice => Self::all(),
            BiometricType::Finger => &[DeviceFamily::FingerSlap, DeviceFamily::FingerSingle],
            BiometricType::Iris => &[DeviceFamily::IrisDouble, DeviceFamily::IrisSingle],
            BiometricType::Face => &[DeviceFamily::Face],
        }
    }

    pub fn device_type(self) -> &'static str {
        match self {
            DeviceFamily::FingerSlap | DeviceFamily::FingerSingle => constants::TYPE_FINGER,
            DeviceFamily::IrisDouble | DeviceFamily::IrisSingle => constants::TYPE_IRIS,
            DeviceFamily::Face => constants::TYPE_FACE,
        }
    }

    pub fn sub_type(self) -> &'static str {
        match self {
            DeviceFamily::FingerSlap => constants::SUBTYPE_FINGER_SLAP,
            DeviceFamily::FingerSingle => constants::SUBTYPE_FINGER_SINGLE,
            DeviceFamily::IrisDouble => constants::SUBTYPE_IRIS_DOUBLE,
            DeviceFamily::IrisSingle => constants::SUBTYPE_IRIS_SINGLE,
            DeviceFamily::Face => constants::SUBTYPE_FACE,
        }
    }

    /// Key under which the helper registers with the service.
    pub fn registry_key(self) -> String {
        format!("{}_{}", self.device_type(), self.sub_type())
    }

    /// Directory name for per-device configuration blobs.
    pub fn config_dir_name(self) -> &'static str {
        match self {
            DeviceFamily::FingerSlap => "finger_slap",
            DeviceFamily::FingerSingle => "finger_single",
            DeviceFamily::IrisDouble => "iris_double",
            DeviceFamily::IrisSingle => "iris_single",
            DeviceFamily::Face => "face",
        }
    }

    /// Sub-device ids this family exposes on the wire.
    pub fn sub_device_ids(self) -> &'static [i32] {
        match self {
            DeviceFamily::FingerSlap => &[
                constants::SUB_DEVICE_FINGER_SLAP_LEFT,
                constants::SUB_DEVICE_FINGER_SLAP_RIGHT,
                constants::SUB_DEVICE_FINGER_SLAP_THUMBS,
            ],
            DeviceFamily::IrisDouble => &[
                constants::SUB_DEVICE_IRIS_LEFT,
                constants::SUB_DEVICE_IRIS_RIGHT,
                constants::SUB_DEVICE_IRIS_BOTH,
            ],
            DeviceFamily::FingerSingle | DeviceFamily::IrisSingle | DeviceFamily::Face => {
                &[constants::SUB_DEVICE_SINGLE]
            }
        }
    }

    /// Slots captured by one sub-device. Unknown sub-device ids map to an
    /// empty slot list, which the capture loop treats as nothing to do.
    pub fn slots(self, sub_device_id: i32) -> &'static [SlotId] {
        match (self, sub_device_id) {
            (DeviceFamily::FingerSlap, constants::SUB_DEVICE_FINGER_SLAP_LEFT) => FINGER_SLAP_LEFT,
            (DeviceFamily::FingerSlap, constants::SUB_DEVICE_FINGER_SLAP_RIGHT) => {
                FINGER_SLAP_RIGHT
            }
            (DeviceFamily::FingerSlap, constants::SUB_DEVICE_FINGER_SLAP_THUMBS) => {
                FINGER_SLAP_THUMBS
            }
            (DeviceFamily::FingerSingle, constants::SUB_DEVICE_SINGLE) => FINGER_ALL,
            (DeviceFamily::IrisDouble, constants::SUB_DEVICE_IRIS_LEFT) => IRIS_LEFT,
            (DeviceFamily::IrisDouble, constants::SUB_DEVICE_IRIS_RIGHT) => IRIS_RIGHT,
            (DeviceFamily::IrisDouble, constants::SUB_DEVICE_IRIS_BOTH) => IRIS_BOTH,
            (DeviceFamily::IrisSingle, constants::SUB_DEVICE_SINGLE) => IRIS_BOTH,
            (DeviceFamily::Face, constants::SUB_DEVICE_SINGLE) => FACE_ALL,
            _ => NO_SLOTS,
        }
    }

    /// Every slot this family can ever capture.
    pub fn all_slots(self) -> &'static [SlotId] {
        match self {
            DeviceFamily::FingerSlap | DeviceFamily::FingerSingle => FINGER_ALL,
            DeviceFamily::IrisDouble | DeviceFamily::IrisSingle => IRIS_BOTH,
            DeviceFamily::Face => FACE_ALL,
        }
    }

    /// Face captures do not use the exception checklist; the exception
    /// list instead switches the served sample to the exception photo.
    pub fn supports_exceptions(self) -> bool {
        !matches!(self, DeviceFamily::Face)
    }

    /// Default identity values used when no per-device JSON blob is
    /// configured.
    pub fn default_serial(self) -> &'static str {
        match self {
            DeviceFamily::FingerSlap => "FS001",
            DeviceFamily::FingerSingle => "FG001",
            DeviceFamily::IrisDouble => "ID001",
            DeviceFamily::IrisSingle => "IS001",
            DeviceFamily::Face => "FA001",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            DeviceFamily::FingerSlap => "SLAP01",
            DeviceFamily::FingerSingle => "SINGLE01",
            DeviceFamily::IrisDouble => "DOUBLE01",
            DeviceFamily::IrisSingle => "MONO01",
            DeviceFamily::Face => "FACE01",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_keys_are_type_underscore_subtype() {
        assert_eq!(DeviceFamily::FingerSlap.registry_key(), "Finger_Slap");
        assert_eq!(DeviceFamily::IrisDouble.registry_key(), "Iris_Double");
        assert_eq!(DeviceFamily::Face.registry_key(), "Face_Full face");
    }

    #[test]
    fn composite_type_instantiates_every_family() {
        assert_eq!(
            DeviceFamily::for_biometric_type(BiometricType::BiometricDevice).len(),
            5
        );
        assert_eq!(
            DeviceFamily::for_biometric_type(BiometricType::Face),
            &[DeviceFamily::Face]
        );
    }

    #[test]
    fn slap_sub_devices_partition_the_hand() {
        let left = DeviceFamily::FingerSlap.slots(1);
        let right = DeviceFamily::FingerSlap.slots(2);
        let thumbs = DeviceFamily::FingerSlap.slots(3);
        assert_eq!(left.len() + right.len() + thumbs.len(), 10);
        assert!(thumbs.contains(&SlotId::LeftThumb));
        assert!(DeviceFamily::FingerSlap.slots(9).is_empty());
    }

    #[test]
    fn single_finger_device_captures_all_ten() {
        assert_eq!(DeviceFamily::FingerSingle.slots(0).len(), 10);
    }

    #[test]
    fn iris_both_covers_left_and_right() {
        assert_eq!(DeviceFamily::IrisDouble.slots(3), &[SlotId::LeftIris, SlotId::RightIris]);
        assert_eq!(DeviceFamily::IrisSingle.slots(0).len(), 2);
    }

    #[test]
    fn face_skips_exception_checklist() {
        assert!(!DeviceFamily::Face.supports_exceptions());
        assert!(DeviceFamily::FingerSlap.supports_exceptions());
    }
}
