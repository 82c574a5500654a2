//! Sample stores and temporary table files.

use recpatch_core::record::{from_table, to_table, TableEntry};
use recpatch_core::{MemoryRecordStore, Record, RecordId, RecordOption, RecordStore, VarType};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builds a flat store from records, in order.
pub fn store_from(records: impl IntoIterator<Item = Record>) -> MemoryRecordStore {
    let mut store = MemoryRecordStore::new();
    for record in records {
        store.insert(record).expect("Failed to insert record");
    }
    store
}

/// A small tree resembling a real table:
///
/// ```text
/// Player                 (group)
///   Health               4 Bytes at game.exe+1F00
///   Ammo                 pointer with offsets [0x10, 0x8], dropdown
/// Infinite Ammo          script
/// Speed                  Float
/// ```
pub fn sample_store() -> MemoryRecordStore {
    let mut store = MemoryRecordStore::new();
    let mut player = Record::new("Player").with_type(VarType::Grouped);
    player.options.insert(RecordOption::ActivateChildrenAsWell);
    let player = store.insert(player).expect("Failed to insert group");

    store
        .insert_child(player, Record::new("Health").with_address("game.exe+1F00"))
        .expect("Failed to insert child");
    store
        .insert_child(
            player,
            Record::new("Ammo")
                .with_address("[game.exe+2A00]")
                .with_offsets(vec![0x10, 0x8])
                .with_dropdown(vec!["0:Empty".into(), "30:Full".into()]),
        )
        .expect("Failed to insert child");
    store
        .insert(
            Record::new("Infinite Ammo")
                .with_script("[ENABLE]\nmov [rax+10],#30\n[DISABLE]\nmov [rax+10],eax\n"),
        )
        .expect("Failed to insert script");
    store
        .insert(
            Record::new("Speed")
                .with_type(VarType::Float)
                .with_address("game.exe+3000"),
        )
        .expect("Failed to insert record");
    store
}

/// Looks up a record ID by exact description.
pub fn id_of<S: RecordStore + ?Sized>(store: &S, description: &str) -> RecordId {
    store
        .get_by_description(description, true)
        .map(|r| r.id)
        .unwrap_or_else(|| panic!("no record described {description:?}"))
}

/// A temporary directory for record-table and patch-set files.
pub struct TempTables {
    dir: TempDir,
}

impl TempTables {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `store` as a JSON record table and returns the file path.
    pub fn write_store(&self, name: &str, store: &MemoryRecordStore) -> PathBuf {
        let json = serde_json::to_vec_pretty(&to_table(store)).expect("Failed to encode table");
        self.write_bytes(name, &json)
    }

    /// Writes raw bytes and returns the file path.
    pub fn write_bytes(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, bytes).expect("Failed to write file");
        path
    }

    /// Reads a JSON record table back into a store.
    pub fn read_store(&self, path: impl AsRef<Path>) -> MemoryRecordStore {
        let bytes = std::fs::read(path).expect("Failed to read table");
        let entries: Vec<TableEntry> = serde_json::from_slice(&bytes).expect("Failed to decode table");
        from_table(entries).expect("Failed to load table")
    }
}

impl Default for TempTables {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recpatch_core::build_fingerprint;

    #[test]
    fn sample_store_shape() {
        let store = sample_store();
        assert_eq!(store.count(), 5);
        assert_eq!(store.get_by_index(1).unwrap().description, "Health");
        assert_eq!(store.children_of(id_of(&store, "Player")).len(), 2);
    }

    #[test]
    fn table_files_round_trip() {
        let tables = TempTables::new();
        let store = sample_store();
        let path = tables.write_store("table.json", &store);

        let loaded = tables.read_store(&path);
        assert_eq!(build_fingerprint(&loaded).unwrap(), build_fingerprint(&store).unwrap());
        assert_eq!(loaded.children_of(id_of(&loaded, "Player")).len(), 2);
    }
}
