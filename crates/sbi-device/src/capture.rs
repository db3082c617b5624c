//! Per-capture-session state.
//!
//! A `CaptureInfo` is allocated by `initDevice` and discarded by
//! `deInitDevice`. Capture is monotonic within one session: a slot that has
//! been marked captured keeps its value and score until the whole structure
//! is reset.

use std::collections::BTreeMap;

use crate::exception::BioException;
use crate::family::DeviceFamily;
use crate::slot::SlotId;

/// State of one anatomical slot within a capture session.
#[derive(Clone, Debug, Default)]
pub struct SlotState {
    /// Base64url-encoded ISO payload, present once the slot is filled.
    pub bio_value: Option<String>,
    pub requested_score: i32,
    pub captured_score: i32,
    pub captured: bool,
}

/// Capture bookkeeping for one device helper.
#[derive(Clone, Debug)]
pub struct CaptureInfo {
    pub image: Option<Vec<u8>>,
    pub live_stream_started: bool,
    pub live_stream_completed: bool,
    pub capture_started: bool,
    pub capture_completed: bool,
    pub requested_score: i32,
    pub exceptions: BioException,
    slots: BTreeMap<SlotId, SlotState>,
}

impl CaptureInfo {
    /// Fresh state for a family: all flags false, no image, every slot
    /// uncaptured, exception checklist clear.
    pub fn new(family: DeviceFamily) -> Self {
        let slots = family
            .all_slots()
            .iter()
            .map(|slot| (*slot, SlotState::default()))
            .collect();
        Self {
            image: None,
            live_stream_started: false,
            live_stream_completed: false,
            capture_started: false,
            capture_completed: false,
            requested_score: 0,
            exceptions: BioException::default(),
            slots,
        }
    }

    pub fn slot(&self, id: SlotId) -> Option<&SlotState> {
        self.slots.get(&id)
    }

    /// Fill a slot. Returns false (and leaves the slot untouched) if it was
    /// already captured — re-capture within a session is a no-op.
    pub fn record_capture(&mut self, id: SlotId, bio_value: String, captured_score: i32) -> bool {
        match self.slots.get_mut(&id) {
            Some(state) if !state.captured => {
                state.bio_value = Some(bio_value);
                state.captured_score = captured_score;
                state.requested_score = self.requested_score;
                state.captured = true;
                true
            }
            _ => false,
        }
    }

    /// Mark a slot handled without a value (excepted body part). The
    /// captured flag stops the poll loop from re-reading the slot.
    pub fn mark_skipped(&mut self, id: SlotId) {
        if let Some(state) = self.slots.get_mut(&id) {
            state.captured = true;
        }
    }

    /// True when at least one slot holds an actual payload. Slots skipped
    /// through the exception checklist do not count.
    pub fn any_filled(&self) -> bool {
        self.slots.values().any(|s| s.bio_value.is_some())
    }

    /// True when every listed slot has been handled (filled or skipped).
    pub fn all_handled(&self, slots: &[SlotId]) -> bool {
        slots
            .iter()
            .all(|id| self.slots.get(id).map_or(true, |s| s.captured))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_state_is_empty() {
        let info = CaptureInfo::new(DeviceFamily::FingerSlap);
        assert!(!info.capture_started);
        assert!(!info.capture_completed);
        assert!(!info.any_filled());
        assert_eq!(info.slot(SlotId::LeftIndex).unwrap().captured, false);
    }

    #[test]
    fn capture_is_monotonic() {
        let mut info = CaptureInfo::new(DeviceFamily::FingerSlap);
        assert!(info.record_capture(SlotId::LeftIndex, "first".into(), 40));
        // A second capture of the same slot must not overwrite the value.
        assert!(!info.record_capture(SlotId::LeftIndex, "second".into(), 90));
        let slot = info.slot(SlotId::LeftIndex).unwrap();
        assert_eq!(slot.bio_value.as_deref(), Some("first"));
        assert_eq!(slot.captured_score, 40);
    }

    #[test]
    fn skipped_slots_do_not_count_as_filled() {
        let mut info = CaptureInfo::new(DeviceFamily::FingerSlap);
        info.mark_skipped(SlotId::LeftIndex);
        assert!(!info.any_filled());
        assert!(info.slot(SlotId::LeftIndex).unwrap().captured);
    }

    #[test]
    fn all_handled_tracks_the_requested_slot_list() {
        let mut info = CaptureInfo::new(DeviceFamily::FingerSlap);
        let left = DeviceFamily::FingerSlap.slots(1);
        assert!(!info.all_handled(left));
        for id in left {
            info.mark_skipped(*id);
        }
        assert!(info.all_handled(left));
        // Other sub-devices remain unhandled.
        assert!(!info.all_handled(DeviceFamily::FingerSlap.slots(2)));
    }

    #[test]
    fn slots_outside_the_family_are_rejected() {
        let mut info = CaptureInfo::new(DeviceFamily::Face);
        assert!(!info.record_capture(SlotId::LeftIndex, "x".into(), 10));
        assert!(info.slot(SlotId::LeftIndex).is_none());
    }
}
