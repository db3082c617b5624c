//! Biometric codec collaborator.
//!
//! ISO template scoring and image-to-ISO conversion are external concerns;
//! the device layer consumes them through this trait. The shipped
//! [`StaticCodec`] answers with configured values, which is what the
//! simulator needs for deterministic tests.

use sbi_core::{SbiError, SbiResult};

/// Narrow interface over the biometric codec service.
pub trait BioCodec: Send + Sync {
    /// Extract the quality score from an ISO-encoded sample.
    fn quality_from_iso(&self, purpose: &str, modality: &str, iso: &[u8]) -> SbiResult<i32>;

    /// Convert a raw image into an ISO-encoded sample.
    fn image_to_iso(
        &self,
        purpose: &str,
        modality: &str,
        bio_sub_type: Option<&str>,
        image: &[u8],
    ) -> SbiResult<Vec<u8>>;
}

/// Deterministic codec: a fixed quality score, identity conversion.
#[derive(Clone, Copy, Debug)]
pub struct StaticCodec {
    pub quality: i32,
}

impl StaticCodec {
    pub fn new(quality: i32) -> Self {
        Self { quality }
    }
}

impl BioCodec for StaticCodec {
    fn quality_from_iso(&self, _purpose: &str, modality: &str, iso: &[u8]) -> SbiResult<i32> {
        if iso.is_empty() {
            return Err(SbiError::codec(modality, "empty ISO payload"));
        }
        Ok(self.quality)
    }

    fn image_to_iso(
        &self,
        _purpose: &str,
        modality: &str,
        _bio_sub_type: Option<&str>,
        image: &[u8],
    ) -> SbiResult<Vec<u8>> {
        if image.is_empty() {
            return Err(SbiError::codec(modality, "empty image payload"));
        }
        Ok(image.to_vec())
    }
}
