//! Simulated biometric capture devices.
//!
//! One [`DeviceHelper`] exists per (biometric type, sub-type) pair and owns
//! the capture lifecycle for that device: init/deinit, live streaming, and
//! the slot-by-slot sampling state machine that synthesizes ISO-encoded
//! biometric payloads from canned profile files.
//!
//! The per-modality capture bookkeeping is data-driven: a single generic
//! [`CaptureInfo`] holds a map from anatomical [`SlotId`] to slot state,
//! and each [`DeviceFamily`] contributes a static table of the slots its
//! sub-devices expose.

pub mod capture;
pub mod codec;
pub mod exception;
pub mod family;
pub mod helper;
pub mod profile;
pub mod slot;

pub use capture::{CaptureInfo, SlotState};
pub use codec::{BioCodec, StaticCodec};
pub use exception::BioException;
pub use family::DeviceFamily;
pub use helper::{DeviceHelper, DeviceHelperConfig};
pub use profile::ProfileStore;
pub use slot::SlotId;
