//! The per-device capture state machine.
//!
//! One `DeviceHelper` exists per (biometric type, sub-type) pair. It owns
//! the device identity blobs (digital id, discovery entry, device info),
//! the advertised status, and the capture session state. Helpers are not
//! internally synchronized; the service wraps each one in a mutex and the
//! worker locks it per poll iteration.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::warn;

use sbi_core::constants;
use sbi_core::dto::{DeviceInfo, DeviceInfoDto, DigitalId, DiscoverDto, ErrorInfo};
use sbi_core::types::{ImageFormat, Purpose};
use sbi_core::util::{base64_url_encode, iso8601_timestamp};
use sbi_core::{SbiError, SbiResult, Signer};

use crate::capture::CaptureInfo;
use crate::codec::BioCodec;
use crate::family::DeviceFamily;
use crate::profile::{seed_name, ProfileStore};
use crate::slot::SlotId;

/// Construction-time configuration for one helper.
#[derive(Clone, Debug)]
pub struct DeviceHelperConfig {
    pub family: DeviceFamily,
    pub port: u16,
    pub purpose: Purpose,
    pub image_format: ImageFormat,
    pub profile_id: String,
    pub quality_score: i32,
    pub score_from_iso: bool,
    /// Seed ranges for the Automatic profile, one per purpose.
    pub auth_seed_range: u32,
    pub registration_seed_range: u32,
    pub server_address: String,
    /// Directory of per-device JSON blobs and stream images.
    pub device_config_dir: PathBuf,
    /// Root of the canned-sample profile folders.
    pub profile_root: PathBuf,
}

/// One simulated biometric capture device.
pub struct DeviceHelper {
    family: DeviceFamily,
    port: u16,
    purpose: Purpose,
    image_format: ImageFormat,
    profile_id: String,
    quality_score: i32,
    score_from_iso: bool,
    auth_seed_range: u32,
    registration_seed_range: u32,
    server_address: String,
    config_dir: PathBuf,

    device_id: String,
    device_sub_id: i32,
    device_status: String,

    digital_id: Option<DigitalId>,
    discover: Option<DiscoverDto>,
    device_info: Option<DeviceInfo>,
    device_info_dto: Option<DeviceInfoDto>,

    capture: Option<CaptureInfo>,

    store: ProfileStore,
    codec: Arc<dyn BioCodec>,
    signer: Signer,
}

impl DeviceHelper {
    pub fn new(config: DeviceHelperConfig, codec: Arc<dyn BioCodec>, signer: Signer) -> Self {
        let store = ProfileStore::new(config.profile_root.clone());
        let config_dir = config.device_config_dir.join(config.family.config_dir_name());
        let mut helper = Self {
            family: config.family,
            port: config.port,
            purpose: config.purpose,
            image_format: config.image_format,
            profile_id: config.profile_id,
            quality_score: config.quality_score,
            score_from_iso: config.score_from_iso,
            auth_seed_range: config.auth_seed_range,
            registration_seed_range: config.registration_seed_range,
            server_address: config.server_address,
            config_dir,
            device_id: String::new(),
            device_sub_id: 0,
            device_status: constants::DEVICE_STATUS_READY.to_string(),
            digital_id: None,
            discover: None,
            device_info: None,
            device_info_dto: None,
            capture: None,
            store,
            codec,
            signer,
        };
        helper.init_device_details();
        helper
    }

    /// (Re)load the identity blobs. Called at construction and before each
    /// discovery/info answer so the blobs carry the current status and a
    /// fresh timestamp.
    pub fn init_device_details(&mut self) {
        let mut digital_id = self.load_digital_id();
        digital_id.date_time = Some(iso8601_timestamp());

        match self.build_discover(&digital_id) {
            Ok(discover) => self.discover = Some(discover),
            Err(e) => {
                warn!(family = ?self.family, error = %e, "discovery entry unavailable");
                self.discover = None;
            }
        }
        match self.build_device_info(&digital_id) {
            Ok(info) => {
                match self.build_device_info_dto(&info) {
                    Ok(dto) => self.device_info_dto = Some(dto),
                    Err(e) => {
                        warn!(family = ?self.family, error = %e, "device info envelope unavailable");
                        self.device_info_dto = None;
                    }
                }
                self.device_id = info.device_id.clone();
                self.device_info = Some(info);
            }
            Err(e) => {
                warn!(family = ?self.family, error = %e, "device info unavailable");
                self.device_info = None;
                self.device_info_dto = None;
            }
        }
        self.digital_id = Some(digital_id);
    }

    fn load_digital_id(&self) -> DigitalId {
        self.load_json_or("digital_id.json", || DigitalId {
            serial_no: self.family.default_serial().to_string(),
            make: "Mock Device Provider".to_string(),
            model: self.family.default_model().to_string(),
            device_type: self.family.device_type().to_string(),
            device_sub_type: self.family.sub_type().to_string(),
            device_provider_id: "MOCK.SBI".to_string(),
            device_provider: "Mock Device Provider".to_string(),
            date_time: None,
        })
    }

    fn build_discover(&self, digital_id: &DigitalId) -> SbiResult<DiscoverDto> {
        let mut discover: DiscoverDto = self.load_json_or("discover.json", || DiscoverDto {
            device_id: digital_id.serial_no.clone(),
            certification: "L0".to_string(),
            service_version: constants::SPEC_VERSION.to_string(),
            device_code: format!("MOCK-{}", digital_id.serial_no),
            spec_version: vec![constants::SPEC_VERSION.to_string()],
            device_sub_id: self.sub_device_id_strings(),
            ..Default::default()
        });
        discover.digital_id = base64_url_encode(&serde_json::to_vec(digital_id)?);
        discover.device_status = self.device_status.clone();
        discover.purpose = self.purpose.as_str().to_string();
        discover.callback_id = self.callback_id();
        discover.error = Some(ErrorInfo::from_catalog("en", "100"));
        Ok(discover)
    }

    fn build_device_info(&self, digital_id: &DigitalId) -> SbiResult<DeviceInfo> {
        let mut info: DeviceInfo = self.load_json_or("device_info.json", || DeviceInfo {
            spec_version: vec![constants::SPEC_VERSION.to_string()],
            env: "Developer".to_string(),
            device_id: digital_id.serial_no.clone(),
            device_code: format!("MOCK-{}", digital_id.serial_no),
            service_version: constants::SPEC_VERSION.to_string(),
            firmware: "1.0.0".to_string(),
            certification: "L0".to_string(),
            device_sub_id: self.sub_device_id_strings(),
            ..Default::default()
        });
        info.digital_id = self.signer.sign(&serde_json::to_vec(digital_id)?)?;
        info.device_status = self.device_status.clone();
        info.purpose = self.purpose.as_str().to_string();
        info.callback_id = self.callback_id();
        Ok(info)
    }

    fn build_device_info_dto(&self, info: &DeviceInfo) -> SbiResult<DeviceInfoDto> {
        let signed = self.signer.sign(&serde_json::to_vec(info)?)?;
        Ok(DeviceInfoDto {
            device_info: Some(signed),
            error: Some(ErrorInfo::from_catalog("en", "100")),
        })
    }

    fn load_json_or<T: serde::de::DeserializeOwned>(
        &self,
        file: &str,
        fallback: impl FnOnce() -> T,
    ) -> T {
        let path = self.config_dir.join(file);
        match std::fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => value,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "malformed device blob, using defaults");
                    fallback()
                }
            },
            Err(_) => fallback(),
        }
    }

    fn callback_id(&self) -> String {
        format!("http://{}:{}/", self.server_address, self.port)
    }

    fn sub_device_id_strings(&self) -> Vec<String> {
        self.family
            .sub_device_ids()
            .iter()
            .map(|id| id.to_string())
            .collect()
    }

    // ---------------------------------------------------------------------
    // Capture lifecycle
    // ---------------------------------------------------------------------

    /// Allocate a fresh capture session. Always replaces prior state.
    pub fn init_device(&mut self) {
        self.capture = Some(CaptureInfo::new(self.family));
    }

    /// Discard the capture session. Safe to call when already
    /// uninitialized.
    pub fn deinit_device(&mut self) {
        if let Some(capture) = self.capture.as_mut() {
            capture.exceptions.clear();
        }
        self.capture = None;
    }

    /// Fetch the next live-stream frame into the capture buffer. Returns
    /// `Ok(false)` when no stream image is available for the selected
    /// sub-device.
    pub fn get_live_stream(&mut self) -> SbiResult<bool> {
        let file = self.stream_image_name();
        let path = self.config_dir.join(file);
        let image = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        if image.is_empty() {
            return Ok(false);
        }
        match self.capture.as_mut() {
            Some(capture) => {
                capture.image = Some(image);
                Ok(true)
            }
            None => Err(SbiError::device("live stream polled before initDevice")),
        }
    }

    fn stream_image_name(&self) -> &'static str {
        match (self.family, self.device_sub_id) {
            (DeviceFamily::FingerSlap, constants::SUB_DEVICE_FINGER_SLAP_LEFT) => {
                "stream_left.jpg"
            }
            (DeviceFamily::FingerSlap, constants::SUB_DEVICE_FINGER_SLAP_RIGHT) => {
                "stream_right.jpg"
            }
            (DeviceFamily::FingerSlap, constants::SUB_DEVICE_FINGER_SLAP_THUMBS) => {
                "stream_thumbs.jpg"
            }
            (DeviceFamily::IrisDouble, constants::SUB_DEVICE_IRIS_LEFT) => "stream_left.jpg",
            (DeviceFamily::IrisDouble, constants::SUB_DEVICE_IRIS_RIGHT) => "stream_right.jpg",
            (DeviceFamily::IrisDouble, constants::SUB_DEVICE_IRIS_BOTH) => "stream_both.jpg",
            (DeviceFamily::Face, _) => "stream_face.jpg",
            _ => "stream_full.jpg",
        }
    }

    /// One capture pass over every slot of the selected sub-device.
    ///
    /// Safe to call repeatedly from the worker's poll loop: slots already
    /// captured are skipped without touching the sample store, slots on the
    /// exception checklist are marked handled without a value, and a slot
    /// whose sample file is absent simply stays uncaptured. The session
    /// completes as soon as any slot holds a value.
    pub fn get_bio_capture(&mut self, for_auth: bool) -> SbiResult<()> {
        if self.capture.is_none() {
            return Err(SbiError::device("capture polled before initDevice"));
        }

        let profile_dir = self.effective_profile(for_auth);
        let slots = self.family.slots(self.device_sub_id);
        let supports_exceptions = self.family.supports_exceptions();

        let mut skipped: Vec<SlotId> = Vec::new();
        let mut filled: Vec<(SlotId, String, i32)> = Vec::new();
        {
            // Read-only pass: decide what each slot needs before mutating.
            let capture = self.capture.as_ref().ok_or_else(|| {
                SbiError::device("capture polled before initDevice")
            })?;
            for &slot in slots {
                if supports_exceptions && capture.exceptions.is_checked(slot) {
                    skipped.push(slot);
                    continue;
                }
                if capture.slot(slot).map_or(false, |s| s.captured) {
                    continue;
                }
                let file_name = slot.file_name(self.image_format);
                if let Some(iso) = self.store.read_sample(&profile_dir, &file_name)? {
                    let score = if self.score_from_iso {
                        self.codec
                            .quality_from_iso(self.purpose.as_str(), slot.modality(), &iso)?
                    } else {
                        self.quality_score
                    };
                    filled.push((slot, base64_url_encode(&iso), score));
                }
            }
        }

        if let Some(capture) = self.capture.as_mut() {
            for slot in skipped {
                capture.mark_skipped(slot);
            }
            for (slot, value, score) in filled {
                capture.record_capture(slot, value, score);
            }
            if capture.any_filled() {
                capture.capture_completed = true;
            }
        }
        Ok(())
    }

    fn effective_profile(&self, for_auth: bool) -> String {
        if self.profile_id == constants::PROFILE_AUTOMATIC {
            let range = if for_auth {
                self.auth_seed_range
            } else {
                self.registration_seed_range
            };
            seed_name(range)
        } else {
            self.profile_id.clone()
        }
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    pub fn purpose(&self) -> Purpose {
        self.purpose
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn set_device_id(&mut self, device_id: impl Into<String>) {
        self.device_id = device_id.into();
    }

    pub fn device_sub_id(&self) -> i32 {
        self.device_sub_id
    }

    pub fn set_device_sub_id(&mut self, sub_id: i32) {
        self.device_sub_id = sub_id;
    }

    pub fn device_status(&self) -> &str {
        &self.device_status
    }

    pub fn set_device_status(&mut self, status: impl Into<String>) {
        self.device_status = status.into();
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn set_profile_id(&mut self, profile_id: impl Into<String>) {
        self.profile_id = profile_id.into();
    }

    pub fn set_quality_score(&mut self, score: i32) {
        self.quality_score = score;
    }

    pub fn set_score_from_iso(&mut self, from_iso: bool) {
        self.score_from_iso = from_iso;
    }

    pub fn digital_id(&self) -> Option<&DigitalId> {
        self.digital_id.as_ref()
    }

    pub fn discover_dto(&self) -> Option<&DiscoverDto> {
        self.discover.as_ref()
    }

    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.device_info.as_ref()
    }

    pub fn device_info_dto(&self) -> Option<&DeviceInfoDto> {
        self.device_info_dto.as_ref()
    }

    pub fn capture_info(&self) -> Option<&CaptureInfo> {
        self.capture.as_ref()
    }

    pub fn capture_info_mut(&mut self) -> Option<&mut CaptureInfo> {
        self.capture.as_mut()
    }

    /// Sign a biometric data block for the response envelope.
    pub fn sign_payload(&self, payload: &[u8]) -> SbiResult<String> {
        self.signer.sign(payload)
    }
}
