//! Snapshot-to-current diffing.

use crate::error::CoreResult;
use crate::fingerprint::build_fingerprint;
use crate::patch::{Patch, PatchSet, PatchSetStatus};
use crate::record::{read_field, RecordStore};
use crate::resolver::TargetSpec;
use crate::schema::{FieldPath, FieldValue, SchemaRegistry};
use crate::snapshot::Snapshot;
use recpatch_codec::Value;
use std::collections::{BTreeSet, HashSet};

/// Emits the patches that take a store in the snapshot's state to the
/// store's current state.
///
/// Records are matched to captured state by ID, then by description.
/// Records with no captured counterpart are skipped, since patches cannot
/// create records. Only fields the snapshot captured are compared. Patch
/// IDs are `"1"`, `"2"`, ... in emission order.
///
/// The set names the current fingerprint as its new fingerprint only when
/// the patches can reach it: the snapshot captured every field and every
/// captured record still pairs with exactly one current record. Otherwise
/// `new_fingerprint` is `None`.
pub fn generate_patch_set<S: RecordStore + ?Sized>(
    snapshot: &Snapshot,
    store: &S,
) -> CoreResult<PatchSet> {
    let options = snapshot.options();
    let mut patches = Vec::new();
    let mut matched = HashSet::new();
    let mut unmatched = 0usize;

    for (index, id) in store.ids().into_iter().enumerate() {
        let Some(record) = store.record(id) else {
            continue;
        };
        let Some(old) = snapshot.locate(record) else {
            tracing::debug!(record = %id, "no captured state, skipping");
            unmatched += 1;
            continue;
        };
        if !matched.insert(old.id) {
            unmatched += 1;
        }

        let custom: BTreeSet<FieldPath> = old
            .fields
            .keys()
            .filter(|path| path.is_custom())
            .cloned()
            .chain(record.extra.keys().map(|name| FieldPath::Custom(name.clone())))
            .collect();
        let paths = SchemaRegistry::known_fields()
            .iter()
            .filter(|path| options.includes(path))
            .cloned()
            .chain(custom);

        for path in paths {
            let current = read_field(record, &path)?;
            let unchanged = match old.field(&path) {
                Some(previous) => *previous == current,
                None => current == FieldValue::Raw(Value::Null),
            };
            if unchanged {
                continue;
            }
            patches.push(Patch::set(
                (patches.len() + 1).to_string(),
                TargetSpec {
                    index: Some(index),
                    id: Some(record.id),
                    description: Some(record.description.clone()),
                },
                path.canonical(),
                current.to_value(),
            ));
        }
    }

    let reachable =
        options.is_complete() && unmatched == 0 && matched.len() == snapshot.record_count();
    tracing::debug!(
        snapshot = snapshot.name(),
        patches = patches.len(),
        reachable,
        "generated patch set"
    );

    Ok(PatchSet {
        status: PatchSetStatus::Ok,
        required_fingerprint: Some(snapshot.fingerprint().clone()),
        new_fingerprint: if reachable {
            Some(build_fingerprint(store)?)
        } else {
            None
        },
        patches,
    })
}
