//! Anatomical capture slots.
//!
//! A slot identifies one capturable body part. Slots replace the original
//! per-modality field explosion: every device family describes itself as a
//! table of `SlotId`s, and capture state is kept per slot.

use sbi_core::constants;
use sbi_core::types::ImageFormat;

/// One capturable anatomical position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotId {
    LeftIndex,
    LeftMiddle,
    LeftRing,
    LeftLittle,
    LeftThumb,
    RightIndex,
    RightMiddle,
    RightRing,
    RightLittle,
    RightThumb,
    LeftIris,
    RightIris,
    Face,
    /// Alternate face sample served when the caller flags missing body
    /// parts on a face capture.
    ExceptionPhoto,
}

impl SlotId {
    /// Wire-level bio-subtype label. Face captures carry no subtype.
    pub fn bio_sub_type(self) -> Option<&'static str> {
        match self {
            SlotId::LeftIndex => Some(constants::BIO_NAME_LEFT_INDEX),
            SlotId::LeftMiddle => Some(constants::BIO_NAME_LEFT_MIDDLE),
            SlotId::LeftRing => Some(constants::BIO_NAME_LEFT_RING),
            SlotId::LeftLittle => Some(constants::BIO_NAME_LEFT_LITTLE),
            SlotId::LeftThumb => Some(constants::BIO_NAME_LEFT_THUMB),
            SlotId::RightIndex => Some(constants::BIO_NAME_RIGHT_INDEX),
            SlotId::RightMiddle => Some(constants::BIO_NAME_RIGHT_MIDDLE),
            SlotId::RightRing => Some(constants::BIO_NAME_RIGHT_RING),
            SlotId::RightLittle => Some(constants::BIO_NAME_RIGHT_LITTLE),
            SlotId::RightThumb => Some(constants::BIO_NAME_RIGHT_THUMB),
            SlotId::LeftIris => Some(constants::BIO_NAME_LEFT_IRIS),
            SlotId::RightIris => Some(constants::BIO_NAME_RIGHT_IRIS),
            SlotId::Face | SlotId::ExceptionPhoto => None,
        }
    }

    /// Resolve an exception-list token. Matching is case-sensitive; tokens
    /// that resolve to nothing are ignored by the caller.
    pub fn from_bio_name(name: &str) -> Option<SlotId> {
        let name = name.trim();
        match name {
            constants::BIO_NAME_LEFT_INDEX => Some(SlotId::LeftIndex),
            constants::BIO_NAME_LEFT_MIDDLE => Some(SlotId::LeftMiddle),
            constants::BIO_NAME_LEFT_RING => Some(SlotId::LeftRing),
            constants::BIO_NAME_LEFT_LITTLE => Some(SlotId::LeftLittle),
            constants::BIO_NAME_LEFT_THUMB => Some(SlotId::LeftThumb),
            constants::BIO_NAME_RIGHT_INDEX => Some(SlotId::RightIndex),
            constants::BIO_NAME_RIGHT_MIDDLE => Some(SlotId::RightMiddle),
            constants::BIO_NAME_RIGHT_RING => Some(SlotId::RightRing),
            constants::BIO_NAME_RIGHT_LITTLE => Some(SlotId::RightLittle),
            constants::BIO_NAME_RIGHT_THUMB => Some(SlotId::RightThumb),
            constants::BIO_NAME_LEFT_IRIS => Some(SlotId::LeftIris),
            constants::BIO_NAME_RIGHT_IRIS => Some(SlotId::RightIris),
            _ => None,
        }
    }

    /// Canned-sample file stem for this slot.
    pub fn file_stem(self) -> &'static str {
        match self {
            SlotId::LeftIndex => "Left_Index",
            SlotId::LeftMiddle => "Left_Middle",
            SlotId::LeftRing => "Left_Ring",
            SlotId::LeftLittle => "Left_Little",
            SlotId::LeftThumb => "Left_Thumb",
            SlotId::RightIndex => "Right_Index",
            SlotId::RightMiddle => "Right_Middle",
            SlotId::RightRing => "Right_Ring",
            SlotId::RightLittle => "Right_Little",
            SlotId::RightThumb => "Right_Thumb",
            SlotId::LeftIris => "Left_Iris",
            SlotId::RightIris => "Right_Iris",
            SlotId::Face => "Face",
            SlotId::ExceptionPhoto => "Face_Exception",
        }
    }

    /// Sample file name for the configured image format. WSQ-encoded
    /// samples live next to the JP2000 ones under a suffixed name.
    pub fn file_name(self, format: ImageFormat) -> String {
        match format {
            ImageFormat::Jp2000 => format!("{}.iso", self.file_stem()),
            ImageFormat::Wsq => format!("{}_wsq.iso", self.file_stem()),
        }
    }

    /// The modality this slot belongs to, as a wire label.
    pub fn modality(self) -> &'static str {
        match self {
            SlotId::LeftIris | SlotId::RightIris => constants::TYPE_IRIS,
            SlotId::Face | SlotId::ExceptionPhoto => constants::TYPE_FACE,
            _ => constants::TYPE_FINGER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bio_name_round_trip() {
        for slot in [
            SlotId::LeftIndex,
            SlotId::RightLittle,
            SlotId::LeftThumb,
            SlotId::LeftIris,
            SlotId::RightIris,
        ] {
            let name = slot.bio_sub_type().unwrap();
            assert_eq!(SlotId::from_bio_name(name), Some(slot));
        }
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(SlotId::from_bio_name("Left IndexFinger"), Some(SlotId::LeftIndex));
        assert_eq!(SlotId::from_bio_name("left indexfinger"), None);
        assert_eq!(SlotId::from_bio_name("LEFT"), None);
    }

    #[test]
    fn wsq_file_names_are_suffixed() {
        assert_eq!(SlotId::LeftIndex.file_name(ImageFormat::Jp2000), "Left_Index.iso");
        assert_eq!(SlotId::LeftIndex.file_name(ImageFormat::Wsq), "Left_Index_wsq.iso");
    }

    #[test]
    fn face_has_no_sub_type() {
        assert_eq!(SlotId::Face.bio_sub_type(), None);
        assert_eq!(SlotId::ExceptionPhoto.bio_sub_type(), None);
    }
}
