//! Diff command implementation.

use super::{load_store, write_file, CommandResult};
use recpatch_core::{generate_patch_set, PatchEngine, PatchSet, Snapshot, SnapshotOptions};
use recpatch_sync_protocol::PatchResponse;
use std::path::Path;

/// Options for the diff command.
#[derive(Debug, Clone)]
pub struct DiffOptions {
    /// Fields captured from the earlier table.
    pub snapshot: SnapshotOptions,
    /// Version written as `targetVersion`.
    pub version: String,
}

/// Diffs two tables. Records are matched by ID first, then by
/// description.
///
/// The new fingerprint is the one the patches produce on the earlier
/// table, so fields left out of the diff keep their earlier values in it.
pub fn diff(before: &Path, after: &Path, options: &DiffOptions) -> CommandResult<PatchSet> {
    let old = load_store(before)?;
    let new = load_store(after)?;
    let snapshot = Snapshot::capture(before.display().to_string(), &old, options.snapshot)?;
    let mut set = generate_patch_set(&snapshot, &new)?;

    let mut projected = old;
    let report = PatchEngine::default().apply_patch_set(&mut projected, &set)?;
    set.new_fingerprint = Some(report.fingerprint);
    tracing::info!(patches = set.len(), "diff generated");
    Ok(set)
}

/// Runs the diff command, printing or writing a patch-response document.
pub fn run(
    before: &Path,
    after: &Path,
    options: &DiffOptions,
    out: Option<&Path>,
) -> CommandResult<()> {
    let set = diff(before, after, options)?;
    let response = PatchResponse::from_patch_set(options.version.clone(), &set);
    let json = serde_json::to_string_pretty(&response)?;

    match out {
        Some(path) => {
            write_file(path, json.as_bytes())?;
            println!("{} patch(es) written to {}", set.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::load_patch_set;
    use recpatch_core::{build_fingerprint, RecordStore};
    use recpatch_testkit::{id_of, sample_store, TempTables};

    fn options() -> DiffOptions {
        DiffOptions {
            snapshot: SnapshotOptions::default(),
            version: "2.0".into(),
        }
    }

    #[test]
    fn diff_writes_a_loadable_patch_set() {
        let tables = TempTables::new();
        let store = sample_store();
        let before = tables.write_store("before.json", &store);

        let mut edited = store.clone();
        let ammo = id_of(&edited, "Ammo");
        edited.record_mut(ammo).unwrap().offsets = vec![0x18];
        let after = tables.write_store("after.json", &edited);

        let out = tables.path().join("patch.json");
        run(&before, &after, &options(), Some(&out)).unwrap();

        let (version, set) = load_patch_set(&out).unwrap();
        assert_eq!(version, "2.0");
        assert_eq!(set.len(), 1);
        assert_eq!(set.patches[0].path, "Offset");
        assert_eq!(set.patches[0].target.id, Some(ammo));
    }

    #[test]
    fn new_fingerprint_matches_the_patched_earlier_table() {
        let tables = TempTables::new();
        let store = sample_store();
        let before = tables.write_store("before.json", &store);

        let mut edited = store.clone();
        let health = id_of(&edited, "Health");
        {
            let record = edited.record_mut(health).unwrap();
            record.address = "game.exe+2F00".into();
            record.value = recpatch_codec::Number::Integer(100);
        }
        let after = tables.write_store("after.json", &edited);

        let set = diff(&before, &after, &options()).unwrap();
        assert_eq!(set.len(), 1);
        assert_ne!(set.new_fingerprint, Some(build_fingerprint(&edited).unwrap()));

        let mut copy = store;
        let report = PatchEngine::default().apply_patch_set(&mut copy, &set).unwrap();
        assert_eq!(Some(report.fingerprint), set.new_fingerprint);
    }

    #[test]
    fn identical_tables_have_no_patches() {
        let tables = TempTables::new();
        let path = tables.write_store("t.json", &sample_store());
        let set = diff(&path, &path, &options()).unwrap();
        assert!(set.is_empty());
        assert_eq!(set.required_fingerprint, set.new_fingerprint);
    }
}
