//! Nested record-table format.
//!
//! A table is a JSON array of records, each optionally carrying its
//! children inline:
//!
//! ```json
//! [{"description": "Player", "children": [{"description": "Health"}]}]
//! ```

use super::memory::MemoryRecordStore;
use super::model::Record;
use super::store::RecordStore;
use crate::error::CoreResult;
use crate::types::RecordId;
use serde::{Deserialize, Serialize};

/// One record of a table, with its subtree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntry {
    /// The record's own fields.
    #[serde(flatten)]
    pub record: Record,
    /// Child entries, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TableEntry>,
}

impl TableEntry {
    /// Creates a leaf entry.
    pub fn leaf(record: Record) -> Self {
        Self {
            record,
            children: Vec::new(),
        }
    }
}

/// Builds a store from table entries. Records without an ID get one.
pub fn from_table(entries: Vec<TableEntry>) -> CoreResult<MemoryRecordStore> {
    let mut store = MemoryRecordStore::new();
    for entry in entries {
        load(&mut store, entry, None)?;
    }
    Ok(store)
}

fn load(
    store: &mut MemoryRecordStore,
    entry: TableEntry,
    parent: Option<RecordId>,
) -> CoreResult<()> {
    let id = match parent {
        Some(p) => store.insert_child(p, entry.record)?,
        None => store.insert(entry.record)?,
    };
    for child in entry.children {
        load(store, child, Some(id))?;
    }
    Ok(())
}

/// Renders a store as table entries.
pub fn to_table(store: &MemoryRecordStore) -> Vec<TableEntry> {
    store
        .roots()
        .iter()
        .filter_map(|&id| dump(store, id))
        .collect()
}

fn dump(store: &MemoryRecordStore, id: RecordId) -> Option<TableEntry> {
    let record = store.record(id)?.clone();
    let children = store
        .children_of(id)
        .iter()
        .filter_map(|&child| dump(store, child))
        .collect();
    Some(TableEntry { record, children })
}
