//! Per-patch application.

use super::rollback::RollbackLog;
use crate::error::{CoreError, CoreResult, ErrorKind};
use crate::fingerprint::Fingerprint;
use crate::patch::Patch;
use crate::record::RecordStore;
use crate::resolver::TargetResolver;
use crate::schema::{coerce, FieldPath, FieldValue, FieldWrite, SchemaRegistry};
use crate::types::RecordId;
use std::fmt;

/// Outcome of a successful apply transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    /// Patches that wrote a field.
    pub applied: usize,
    /// Patches whose field already held the new value.
    pub skipped: usize,
    /// Rollback entries held after the transaction.
    pub touched_fields: usize,
    /// Store fingerprint after the transaction.
    pub fingerprint: Fingerprint,
}

/// A failed apply transaction.
#[derive(Debug)]
pub struct ApplyError {
    /// Zero-based position of the failing patch; `None` for failures
    /// outside any single patch (fingerprint checks).
    pub position: Option<usize>,
    /// ID of the failing patch.
    pub patch_id: Option<String>,
    /// The underlying error.
    pub source: CoreError,
    /// Whether the store was restored to its pre-apply state.
    pub reverted: bool,
}

impl ApplyError {
    /// Creates an error not tied to a patch.
    pub fn transaction(source: CoreError, reverted: bool) -> Self {
        Self {
            position: None,
            patch_id: None,
            source,
            reverted,
        }
    }

    /// Creates an error for the patch at `position`.
    pub fn at_patch(position: usize, patch: &Patch, source: CoreError, reverted: bool) -> Self {
        Self {
            position: Some(position),
            patch_id: Some(patch.id.clone()),
            source,
            reverted,
        }
    }

    /// Returns the taxonomy bucket of the underlying error.
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.patch_id, self.position) {
            (Some(id), Some(pos)) => write!(f, "patch {id} (#{}) failed: {}", pos + 1, self.source),
            _ => write!(f, "apply failed: {}", self.source),
        }
    }
}

impl std::error::Error for ApplyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Applies single patches, capturing rollback on first touch.
#[derive(Debug, Clone, Copy, Default)]
pub struct Applier {
    resolver: TargetResolver,
}

impl Applier {
    /// Creates an applier using the given resolver.
    pub fn new(resolver: TargetResolver) -> Self {
        Self { resolver }
    }

    /// Applies one patch. Returns false if the field already held the new
    /// value, in which case nothing is written or captured.
    pub fn apply<S: RecordStore + ?Sized>(
        &self,
        store: &mut S,
        log: &mut RollbackLog,
        patch: &Patch,
    ) -> CoreResult<bool> {
        patch.op()?;
        let (id, by) = self.resolver.resolve(store, &patch.target)?;
        let entry = SchemaRegistry::lookup(&patch.path)?;

        let new_value = match coerce(&entry, &patch.value)? {
            FieldWrite::Assign(value) => value,
            FieldWrite::Substitute(sub) => match store.read_field(id, &FieldPath::Script)? {
                FieldValue::Script(Some(body)) => FieldValue::Script(Some(sub.apply(&body)?)),
                _ => {
                    return Err(CoreError::coercion(
                        entry.path.canonical(),
                        "record has no script to substitute in",
                    ))
                }
            },
        };

        if store.read_field(id, &entry.path).ok().as_ref() == Some(&new_value) {
            tracing::debug!(patch = %patch.id, record = %id, path = %entry.path, "already up to date");
            return Ok(false);
        }

        let scope = entry.path.rollback_scope();
        log.capture_with(id, scope, |path| store.read_field(id, path))?;
        store_value(store, id, &entry.path, &new_value)?;

        tracing::debug!(
            patch = %patch.id,
            record = %id,
            path = %entry.path,
            resolved_by = ?by,
            "field written"
        );
        Ok(true)
    }
}

/// Writes a field through the store, routing list kinds through the
/// list-specific operations so they are replaced whole.
pub fn store_value<S: RecordStore + ?Sized>(
    store: &mut S,
    id: RecordId,
    path: &FieldPath,
    value: &FieldValue,
) -> CoreResult<()> {
    match (path, value) {
        (FieldPath::Offsets, FieldValue::Offsets(list)) => store.set_offset_list(id, list),
        (FieldPath::DropDownList, FieldValue::Entries(list)) => {
            store.clear_entry_list(id)?;
            for entry in list {
                store.add_entry(id, entry)?;
            }
            Ok(())
        }
        _ => store.write_field(id, path, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{MemoryRecordStore, Record};
    use crate::resolver::TargetSpec;
    use recpatch_codec::Value;

    fn setup() -> (MemoryRecordStore, RecordId) {
        let mut store = MemoryRecordStore::new();
        let id = store
            .insert(
                Record::new("R")
                    .with_offsets(vec![0])
                    .with_script("mov eax,1\nnop\nnop"),
            )
            .unwrap();
        (store, id)
    }

    #[test]
    fn offset_list_replaced_whole() {
        let (mut store, id) = setup();
        let mut log = RollbackLog::new();
        let patch = Patch::set("1", TargetSpec::by_id(id), "Offset", vec![4i64, 8, 12]);

        assert!(Applier::default().apply(&mut store, &mut log, &patch).unwrap());
        assert_eq!(store.get_by_id(id).unwrap().offsets, vec![4, 8, 12]);
        assert_eq!(
            log.prior(id, &FieldPath::Offsets),
            Some(&FieldValue::Offsets(vec![0]))
        );
    }

    #[test]
    fn element_write_captures_whole_list() {
        let (mut store, id) = setup();
        let mut log = RollbackLog::new();
        let applier = Applier::default();

        applier
            .apply(&mut store, &mut log, &Patch::set("1", TargetSpec::by_id(id), "Offset.0", 16))
            .unwrap();
        applier
            .apply(&mut store, &mut log, &Patch::set("2", TargetSpec::by_id(id), "Offset.1", 4))
            .unwrap();

        assert_eq!(store.get_by_id(id).unwrap().offsets, vec![16, 4]);
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.prior(id, &FieldPath::Offsets),
            Some(&FieldValue::Offsets(vec![0]))
        );
    }

    #[test]
    fn equal_value_is_skipped() {
        let (mut store, id) = setup();
        let mut log = RollbackLog::new();
        let patch = Patch::set("1", TargetSpec::by_id(id), "Description", "R");

        assert!(!Applier::default().apply(&mut store, &mut log, &patch).unwrap());
        assert!(log.is_empty());
    }

    #[test]
    fn script_substitution() {
        let (mut store, id) = setup();
        let mut log = RollbackLog::new();
        let payload = Value::map(vec![
            ("search".into(), Value::from("nop")),
            ("replace".into(), Value::from("ret")),
        ]);
        let patch = Patch::set("1", TargetSpec::by_id(id), "Script", payload);

        Applier::default().apply(&mut store, &mut log, &patch).unwrap();
        assert_eq!(
            store.get_by_id(id).unwrap().script.as_deref(),
            Some("mov eax,1\nret\nnop")
        );
    }

    #[test]
    fn missing_search_text_fails_without_capture() {
        let (mut store, id) = setup();
        let mut log = RollbackLog::new();
        let payload = Value::map(vec![
            ("search".into(), Value::from("jmp")),
            ("replace".into(), Value::from("ret")),
        ]);
        let patch = Patch::set("1", TargetSpec::by_id(id), "Script", payload);

        let err = Applier::default().apply(&mut store, &mut log, &patch).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Coercion);
        assert!(log.is_empty());
    }

    #[test]
    fn unsupported_op() {
        let (mut store, id) = setup();
        let mut log = RollbackLog::new();
        let mut patch = Patch::set("1", TargetSpec::by_id(id), "Description", "x");
        patch.op = Some("remove".into());
        let err = Applier::default().apply(&mut store, &mut log, &patch).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedOp { .. }));
    }

    #[test]
    fn apply_error_display() {
        let patch = Patch::set("7", TargetSpec::by_index(3), "Value", 1);
        let err = ApplyError::at_patch(1, &patch, CoreError::resolution("index=3"), true);
        assert_eq!(
            err.to_string(),
            "patch 7 (#2) failed: no record matches target index=3"
        );
        assert_eq!(err.kind(), ErrorKind::Resolution);
    }
}
