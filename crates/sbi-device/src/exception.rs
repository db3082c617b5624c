//! Missing-body-part checklist.
//!
//! The caller flags body parts that cannot be captured (amputations,
//! bandages) in the capture request; flagged slots are skipped for the
//! whole transaction. The checklist is transaction-scoped: it is populated
//! at capture start and cleared before the next request.

use std::collections::BTreeSet;

use crate::slot::SlotId;

/// Checklist of body parts excluded from the current capture.
#[derive(Clone, Debug, Default)]
pub struct BioException {
    checked: BTreeSet<SlotId>,
}

impl BioException {
    /// Mark every recognized token. Matching is case-sensitive; unknown
    /// tokens are ignored without error.
    pub fn init(&mut self, tokens: &[String]) {
        for token in tokens {
            if let Some(slot) = SlotId::from_bio_name(token) {
                self.checked.insert(slot);
            }
        }
    }

    /// Reset every flag to unchecked.
    pub fn clear(&mut self) {
        self.checked.clear();
    }

    pub fn is_checked(&self, slot: SlotId) -> bool {
        self.checked.contains(&slot)
    }

    pub fn is_empty(&self) -> bool {
        self.checked.is_empty()
    }
}
