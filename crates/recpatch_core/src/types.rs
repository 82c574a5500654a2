//! Core type definitions for recpatch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a record.
///
/// IDs are assigned when a record is created and never change for the
/// record's lifetime. `RecordId(0)` means "not yet assigned"; stores
/// allocate a fresh ID when such a record is inserted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    /// The unassigned placeholder ID.
    pub const UNASSIGNED: RecordId = RecordId(0);

    /// Creates a new record ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns true if this is the unassigned placeholder.
    #[must_use]
    pub const fn is_unassigned(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rec:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_ordering() {
        assert!(RecordId::new(1) < RecordId::new(2));
    }

    #[test]
    fn record_id_display() {
        assert_eq!(format!("{}", RecordId::new(42)), "rec:42");
    }

    #[test]
    fn unassigned() {
        assert!(RecordId::UNASSIGNED.is_unassigned());
        assert!(RecordId::default().is_unassigned());
        assert!(!RecordId::new(3).is_unassigned());
    }
}
