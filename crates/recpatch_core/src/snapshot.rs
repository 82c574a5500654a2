//! Named captures of per-record field state.

use crate::error::{CoreError, CoreResult};
use crate::fingerprint::{build_fingerprint, Fingerprint};
use crate::record::{Record, RecordStore};
use crate::schema::{FieldPath, FieldValue, SchemaRegistry};
use crate::types::RecordId;
use std::collections::{BTreeMap, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};

/// Which volatile fields a snapshot captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotOptions {
    /// Capture script bodies.
    pub include_scripts: bool,
    /// Capture current values.
    pub include_values: bool,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            include_scripts: true,
            include_values: false,
        }
    }
}

impl SnapshotOptions {
    /// Captures every field.
    #[must_use]
    pub fn all() -> Self {
        Self {
            include_scripts: true,
            include_values: true,
        }
    }

    /// Sets whether scripts are captured.
    #[must_use]
    pub const fn include_scripts(mut self, value: bool) -> Self {
        self.include_scripts = value;
        self
    }

    /// Sets whether values are captured.
    #[must_use]
    pub const fn include_values(mut self, value: bool) -> Self {
        self.include_values = value;
        self
    }

    /// Returns true if every field is captured.
    pub fn is_complete(&self) -> bool {
        self.include_scripts && self.include_values
    }

    /// Returns true if the path is captured (and therefore diffed).
    pub fn includes(&self, path: &FieldPath) -> bool {
        match path {
            FieldPath::Script => self.include_scripts,
            FieldPath::Value => self.include_values,
            _ => true,
        }
    }
}

/// Captured state of one record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordState {
    /// Record ID.
    pub id: RecordId,
    /// Index at capture time.
    pub index: usize,
    /// Description at capture time.
    pub description: String,
    /// Captured fields, known and custom.
    pub fields: BTreeMap<FieldPath, FieldValue>,
}

impl RecordState {
    /// Captures a record through the shared field accessors.
    pub fn capture(record: &Record, index: usize, options: &SnapshotOptions) -> CoreResult<Self> {
        let custom = record.extra.keys().map(|name| FieldPath::Custom(name.clone()));
        let fields: BTreeMap<FieldPath, FieldValue> = SchemaRegistry::known_fields()
            .iter()
            .cloned()
            .chain(custom)
            .filter(|path| options.includes(path))
            .map(|path| {
                let value = crate::record::read_field(record, &path)?;
                Ok((path, value))
            })
            .collect::<CoreResult<_>>()?;
        Ok(Self {
            id: record.id,
            index,
            description: record.description.clone(),
            fields,
        })
    }

    /// Returns a captured field.
    pub fn field(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.fields.get(path)
    }
}

/// A named capture of a whole store.
#[derive(Debug, Clone)]
pub struct Snapshot {
    name: String,
    created_at: u64,
    fingerprint: Fingerprint,
    options: SnapshotOptions,
    records: Vec<RecordState>,
    by_id: HashMap<RecordId, usize>,
    by_description: HashMap<String, usize>,
}

impl Snapshot {
    /// Captures every record in a store.
    pub fn capture<S: RecordStore + ?Sized>(
        name: impl Into<String>,
        store: &S,
        options: SnapshotOptions,
    ) -> CoreResult<Self> {
        let fingerprint = build_fingerprint(store)?;
        let mut records = Vec::new();
        let mut by_id = HashMap::new();
        let mut by_description = HashMap::new();

        for (index, id) in store.ids().into_iter().enumerate() {
            let Some(record) = store.record(id) else {
                continue;
            };
            let state = RecordState::capture(record, index, &options)?;
            by_id.insert(state.id, records.len());
            by_description
                .entry(state.description.clone())
                .or_insert(records.len());
            records.push(state);
        }

        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;

        Ok(Self {
            name: name.into(),
            created_at,
            fingerprint,
            options,
            records,
            by_id,
            by_description,
        })
    }

    /// Returns the snapshot name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the capture time in milliseconds since the Unix epoch.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Returns the store fingerprint at capture time.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Returns the options the snapshot was taken with.
    pub fn options(&self) -> SnapshotOptions {
        self.options
    }

    /// Returns the number of captured records.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Returns every captured record in capture order.
    pub fn records(&self) -> &[RecordState] {
        &self.records
    }

    /// Looks up captured state by record ID.
    pub fn by_id(&self, id: RecordId) -> Option<&RecordState> {
        self.by_id.get(&id).map(|&i| &self.records[i])
    }

    /// Looks up captured state by description. When several records
    /// shared a description, the first in index order is returned.
    pub fn by_description(&self, description: &str) -> Option<&RecordState> {
        self.by_description.get(description).map(|&i| &self.records[i])
    }

    /// Finds the captured state for a current record: by ID first, then by
    /// description.
    pub fn locate(&self, record: &Record) -> Option<&RecordState> {
        self.by_id(record.id)
            .or_else(|| self.by_description(&record.description))
    }
}

/// Snapshots keyed by name. Retaking a name overwrites it.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshots: BTreeMap<String, Snapshot>,
}

impl SnapshotStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures a store under a name and returns the fingerprint at capture.
    pub fn take<S: RecordStore + ?Sized>(
        &mut self,
        name: &str,
        store: &S,
        options: SnapshotOptions,
    ) -> CoreResult<Fingerprint> {
        let snapshot = Snapshot::capture(name, store, options)?;
        let fingerprint = snapshot.fingerprint.clone();
        tracing::debug!(
            snapshot = name,
            records = snapshot.record_count(),
            fingerprint = %fingerprint,
            "captured snapshot"
        );
        self.snapshots.insert(name.to_string(), snapshot);
        Ok(fingerprint)
    }

    /// Returns a snapshot by name.
    pub fn get(&self, name: &str) -> CoreResult<&Snapshot> {
        self.snapshots
            .get(name)
            .ok_or_else(|| CoreError::SnapshotNotFound {
                name: name.to_string(),
            })
    }

    /// Returns snapshot names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.snapshots.keys().cloned().collect()
    }

    /// Removes a snapshot. Returns true if it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        self.snapshots.remove(name).is_some()
    }

    /// Removes every snapshot.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    /// Returns the number of stored snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns true if there are no snapshots.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
