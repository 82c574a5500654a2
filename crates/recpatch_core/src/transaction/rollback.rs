//! First-touch rollback log.

use crate::error::CoreResult;
use crate::schema::{FieldPath, FieldValue};
use crate::types::RecordId;
use std::collections::BTreeMap;

/// A captured pre-mutation value.
#[derive(Debug, Clone, PartialEq)]
pub struct RollbackEntry {
    /// Record the field belongs to.
    pub record: RecordId,
    /// Field path, already widened to its rollback scope.
    pub path: FieldPath,
    /// Value before the transaction first touched the field.
    pub prior: FieldValue,
}

/// Pre-mutation values of every field touched by the current transaction.
///
/// Holds at most one entry per `(record, path)`; later touches of the same
/// field never overwrite the first capture.
#[derive(Debug, Clone, Default)]
pub struct RollbackLog {
    entries: BTreeMap<(RecordId, FieldPath), FieldValue>,
}

impl RollbackLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the field already has an entry.
    pub fn contains(&self, record: RecordId, path: &FieldPath) -> bool {
        self.entries.contains_key(&(record, path.clone()))
    }

    /// Captures a field's prior value unless it is already captured.
    ///
    /// `read` runs only on first touch. Returns true if an entry was added.
    pub fn capture_with<F>(&mut self, record: RecordId, path: FieldPath, read: F) -> CoreResult<bool>
    where
        F: FnOnce(&FieldPath) -> CoreResult<FieldValue>,
    {
        if self.contains(record, &path) {
            return Ok(false);
        }
        let prior = read(&path)?;
        self.entries.insert((record, path), prior);
        Ok(true)
    }

    /// Returns the captured prior value of a field.
    pub fn prior(&self, record: RecordId, path: &FieldPath) -> Option<&FieldValue> {
        self.entries.get(&(record, path.clone()))
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in `(record, path)` order.
    pub fn entries(&self) -> impl Iterator<Item = RollbackEntry> + '_ {
        self.entries
            .iter()
            .map(|((record, path), prior)| RollbackEntry {
                record: *record,
                path: path.clone(),
                prior: prior.clone(),
            })
    }

    /// Removes and returns every entry.
    pub fn drain(&mut self) -> Vec<RollbackEntry> {
        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|((record, path), prior)| RollbackEntry {
                record,
                path,
                prior,
            })
            .collect()
    }

    /// Discards every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
