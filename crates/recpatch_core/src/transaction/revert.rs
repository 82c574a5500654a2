//! Restoring captured field values.

use super::apply::store_value;
use super::rollback::RollbackLog;
use crate::error::{CoreError, CoreResult};
use crate::fingerprint::Fingerprint;
use crate::record::RecordStore;

/// Outcome of a revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertReport {
    /// Fields restored.
    pub restored: usize,
    /// Store fingerprint after restoring.
    pub fingerprint: Fingerprint,
    /// Whether the fingerprint equals the one taken before the apply.
    /// `None` when there was no pre-apply fingerprint to compare with.
    pub matches_pre_apply: Option<bool>,
}

/// Restores every entry of the log and empties it.
///
/// Every entry is attempted even if an earlier one fails; entries are
/// independent, so order does not matter. Returns the number restored, or
/// [`CoreError::RevertIncomplete`] if any entry could not be written.
pub fn restore_all<S: RecordStore + ?Sized>(store: &mut S, log: &mut RollbackLog) -> CoreResult<usize> {
    let entries = log.drain();
    let total = entries.len();
    let mut failures = Vec::new();

    for entry in entries {
        if let Err(e) = store_value(store, entry.record, &entry.path, &entry.prior) {
            tracing::warn!(record = %entry.record, path = %entry.path, error = %e, "restore failed");
            failures.push(e);
        }
    }

    match failures.first() {
        None => Ok(total),
        Some(first) => Err(CoreError::RevertIncomplete {
            failed: failures.len(),
            total,
            first: first.to_string(),
        }),
    }
}
