//! Record store accessor trait.

use super::access;
use super::model::Record;
use crate::error::{CoreError, CoreResult};
use crate::schema::{FieldPath, FieldValue};
use crate::types::RecordId;

/// Access to a tree of records.
///
/// Implementors provide id-addressed access plus the current pre-order
/// traversal. Everything else has a default implementation on top of
/// those three methods. Indices are positions in [`RecordStore::ids`]
/// and must not be cached across calls: any structural edit may shift
/// them.
///
/// The patch engine only reads and writes fields of existing records.
/// Creating, moving and deleting records is left to the implementor.
pub trait RecordStore {
    /// Returns every record ID in pre-order.
    fn ids(&self) -> Vec<RecordId>;

    /// Returns a record by ID.
    fn record(&self, id: RecordId) -> Option<&Record>;

    /// Returns a record by ID for mutation.
    fn record_mut(&mut self, id: RecordId) -> Option<&mut Record>;

    /// Returns the number of records.
    fn count(&self) -> usize {
        self.ids().len()
    }

    /// Returns the record at a pre-order index.
    fn get_by_index(&self, index: usize) -> Option<&Record> {
        let id = *self.ids().get(index)?;
        self.record(id)
    }

    /// Returns a record by ID.
    fn get_by_id(&self, id: RecordId) -> Option<&Record> {
        self.record(id)
    }

    /// Returns the first record, in index order, whose description matches.
    ///
    /// With `exact` the descriptions must be equal. Otherwise they are
    /// compared trimmed and ignoring ASCII case.
    fn get_by_description(&self, description: &str, exact: bool) -> Option<&Record> {
        let wanted = description.trim();
        self.ids()
            .into_iter()
            .filter_map(|id| self.record(id))
            .find(|r| {
                if exact {
                    r.description == description
                } else {
                    r.description.trim().eq_ignore_ascii_case(wanted)
                }
            })
    }

    /// Returns the current index of a record.
    fn index_of(&self, id: RecordId) -> Option<usize> {
        self.ids().iter().position(|&other| other == id)
    }

    /// Reads a field.
    fn read_field(&self, id: RecordId, path: &FieldPath) -> CoreResult<FieldValue> {
        let record = self
            .record(id)
            .ok_or(CoreError::RecordNotFound { id: id.as_u64() })?;
        access::read_field(record, path)
    }

    /// Writes a field.
    fn write_field(&mut self, id: RecordId, path: &FieldPath, value: &FieldValue) -> CoreResult<()> {
        let record = self
            .record_mut(id)
            .ok_or(CoreError::RecordNotFound { id: id.as_u64() })?;
        access::write_field(record, path, value)
    }

    /// Replaces the whole offset list in one step.
    fn set_offset_list(&mut self, id: RecordId, offsets: &[i64]) -> CoreResult<()> {
        self.write_field(id, &FieldPath::Offsets, &FieldValue::Offsets(offsets.to_vec()))
    }

    /// Removes every dropdown entry.
    fn clear_entry_list(&mut self, id: RecordId) -> CoreResult<()> {
        self.write_field(id, &FieldPath::DropDownList, &FieldValue::Entries(Vec::new()))
    }

    /// Appends one dropdown entry.
    fn add_entry(&mut self, id: RecordId, entry: &str) -> CoreResult<()> {
        let record = self
            .record_mut(id)
            .ok_or(CoreError::RecordNotFound { id: id.as_u64() })?;
        record.dropdown.push(entry.to_string());
        Ok(())
    }

    /// Returns the names of fields outside the known schema, sorted.
    fn custom_fields(&self, id: RecordId) -> CoreResult<Vec<String>> {
        let record = self
            .record(id)
            .ok_or(CoreError::RecordNotFound { id: id.as_u64() })?;
        Ok(record.extra.keys().cloned().collect())
    }
}
