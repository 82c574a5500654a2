//! Property tests for fingerprinting, diffing, rollback and resolution.

use proptest::prelude::*;
use recpatch_core::{
    build_fingerprint, generate_patch_set, EngineConfig, ErrorKind, MemoryRecordStore, Patch,
    PatchEngine, PatchSet, RecordId, RecordStore, Snapshot, SnapshotOptions, TargetSpec,
};
use recpatch_testkit::{field_mutation_strategy, records_strategy, store_from, FieldMutation};
use std::collections::BTreeMap;

/// Mutations paired with the index of the record they hit.
fn indexed_mutations(
    records: usize,
    len: std::ops::Range<usize>,
) -> impl Strategy<Value = Vec<(usize, FieldMutation)>> {
    prop::collection::vec((0..records, field_mutation_strategy()), len)
}

fn apply_direct(store: &mut MemoryRecordStore, index: usize, mutation: &FieldMutation) {
    let id = store.get_by_index(index).unwrap().id;
    mutation.apply_to(store.record_mut(id).unwrap());
}

fn records_equal(a: &MemoryRecordStore, b: &MemoryRecordStore) -> bool {
    a.count() == b.count()
        && (0..a.count()).all(|i| a.get_by_index(i) == b.get_by_index(i))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn fingerprint_ignores_order(records in records_strategy(1..8), seed in any::<u64>()) {
        let forward = store_from(records.clone());
        let mut shuffled = records;
        let len = shuffled.len();
        shuffled.rotate_left((seed as usize) % len);
        if seed % 2 == 0 {
            shuffled.reverse();
        }
        let reordered = store_from(shuffled);

        prop_assert_eq!(build_fingerprint(&forward).unwrap(), build_fingerprint(&reordered).unwrap());
    }

    #[test]
    fn fingerprint_sees_every_known_field(
        records in records_strategy(1..6),
        index in any::<prop::sample::Index>(),
        mutation in field_mutation_strategy(),
    ) {
        let mut store = store_from(records);
        let index = index.index(store.count());
        let before_record = store.get_by_index(index).unwrap().clone();
        let before = build_fingerprint(&store).unwrap();

        apply_direct(&mut store, index, &mutation);
        let changed = store.get_by_index(index).unwrap() != &before_record;

        prop_assert_eq!(build_fingerprint(&store).unwrap() != before, changed);
    }

    #[test]
    fn diff_reproduces_changes_on_a_copy(
        records in records_strategy(1..6),
        mutations in indexed_mutations(6, 1..6),
    ) {
        let mut store = store_from(records);
        let original = store.clone();
        let snapshot = Snapshot::capture("base", &store, SnapshotOptions::all()).unwrap();

        let count = store.count();
        for (index, mutation) in &mutations {
            apply_direct(&mut store, index % count, mutation);
        }
        let set = generate_patch_set(&snapshot, &store).unwrap();

        let mut copy = original;
        let mut engine = PatchEngine::default();
        let report = engine.apply_patch_set(&mut copy, &set).unwrap();
        prop_assert_eq!(report.skipped, 0);
        prop_assert!(records_equal(&copy, &store));
        prop_assert_eq!(Some(report.fingerprint), set.new_fingerprint.clone());

        let again = engine.apply_patch_set(&mut copy, &set).unwrap();
        prop_assert_eq!(again.applied, 0);
        prop_assert!(engine.rollback_log().is_empty());
    }

    #[test]
    fn failed_patch_restores_earlier_ones(
        records in records_strategy(2..6),
        before in indexed_mutations(6, 1..5),
        after in indexed_mutations(6, 1..3),
    ) {
        let mut store = store_from(records);
        let original = store.clone();
        let count = store.count();

        let mut patches: Vec<Patch> = before
            .iter()
            .enumerate()
            .map(|(n, (index, m))| m.to_patch((n + 1).to_string(), TargetSpec::by_index(index % count)))
            .collect();
        let failing = patches.len();
        patches.push(Patch::set("bad", TargetSpec::by_id(RecordId::new(1_000_000)), "Active", true));
        patches.extend(
            after
                .iter()
                .map(|(index, m)| m.to_patch("late", TargetSpec::by_index(index % count))),
        );

        let err = PatchEngine::default()
            .apply_patches(&mut store, &patches, None)
            .unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::Resolution);
        prop_assert_eq!(err.position, Some(failing));
        prop_assert!(err.reverted);
        prop_assert!(records_equal(&store, &original));
    }

    #[test]
    fn patches_after_a_failure_never_run(
        records in records_strategy(2..6),
        late in field_mutation_strategy(),
    ) {
        let mut store = store_from(records);
        let last = store.count() - 1;
        let untouched = store.get_by_index(last).unwrap().clone();

        let patches = vec![
            Patch::set("1", TargetSpec::by_index(0), "Color", 0x123456),
            Patch::set("2", TargetSpec::by_description("\u{0}missing"), "Active", true),
            late.to_patch("3", TargetSpec::by_index(last)),
        ];
        let mut engine = PatchEngine::new(EngineConfig::new().safe_mode(false));
        let err = engine.apply_patches(&mut store, &patches, None).unwrap_err();

        prop_assert!(!err.reverted);
        prop_assert_eq!(store.get_by_index(0).unwrap().color, 0x123456);
        prop_assert_eq!(store.get_by_index(last).unwrap(), &untouched);
    }

    #[test]
    fn index_wins_over_id(
        records in records_strategy(2..6),
        pick in any::<prop::sample::Index>(),
        color in 1i64..0xFF_FFFF,
    ) {
        let mut store = store_from(records);
        let count = store.count();
        let index = pick.index(count);
        let other = (index + 1) % count;
        let other_id = store.get_by_index(other).unwrap().id;
        let other_before = store.get_by_index(other).unwrap().clone();

        let target = TargetSpec { index: Some(index), id: Some(other_id), description: None };
        PatchEngine::default()
            .apply_patches(&mut store, &[Patch::set("1", target, "Color", color)], None)
            .unwrap();

        prop_assert_eq!(store.get_by_index(index).unwrap().color, color);
        prop_assert_eq!(store.get_by_index(other).unwrap(), &other_before);
    }

    #[test]
    fn reapplying_changes_nothing(
        records in records_strategy(1..6),
        mutations in indexed_mutations(6, 1..6),
    ) {
        let mut store = store_from(records);
        let count = store.count();
        // One write per field, or a later patch would undo an earlier one.
        let latest: BTreeMap<(usize, &str), &FieldMutation> = mutations
            .iter()
            .map(|(index, m)| ((index % count, m.path()), m))
            .collect();
        let patches = latest
            .iter()
            .enumerate()
            .map(|(n, ((index, _), m))| m.to_patch(n.to_string(), TargetSpec::by_index(*index)))
            .collect();
        let set = PatchSet::new(patches);

        let mut engine = PatchEngine::default();
        engine.apply_patch_set(&mut store, &set).unwrap();
        let settled = store.clone();

        let report = engine.apply_patch_set(&mut store, &set).unwrap();
        prop_assert_eq!(report.applied, 0);
        prop_assert_eq!(report.touched_fields, 0);
        prop_assert!(engine.rollback_log().is_empty());
        prop_assert!(records_equal(&store, &settled));
    }
}
