//! Benchmark utilities.

use recpatch_codec::Number;
use recpatch_core::{
    MemoryRecordStore, Patch, PatchSet, Record, RecordId, RecordStore, TargetSpec, VarType,
};

const TYPES: [VarType; 4] = [
    VarType::FourBytes,
    VarType::Float,
    VarType::Byte,
    VarType::Double,
];

/// Builds a store of `groups` group headers with `width` children each.
pub fn grouped_store(groups: usize, width: usize) -> MemoryRecordStore {
    let mut store = MemoryRecordStore::new();
    for g in 0..groups {
        let Ok(parent) = store.insert(Record::new(format!("Group {g}")).with_type(VarType::Grouped))
        else {
            continue;
        };
        for c in 0..width {
            let n = g * width + c;
            let record = Record::new(format!("Entry {n}"))
                .with_address(format!("game.exe+{:X}", 0x1000 + n * 4))
                .with_type(TYPES[n % TYPES.len()])
                .with_offsets(vec![0x10, (n as i64) * 8])
                .with_value(Number::Integer(n as i64));
            let _ = store.insert_child(parent, record);
        }
    }
    store
}

/// Total number of records in a [`grouped_store`].
pub fn record_count(groups: usize, width: usize) -> usize {
    groups * (width + 1)
}

/// One `Address` and one `Active` patch for every `stride`-th record,
/// targeted by ID.
pub fn sparse_patches(store: &MemoryRecordStore, stride: usize) -> PatchSet {
    let stride = stride.max(1);
    let mut patches = Vec::new();
    for (n, id) in store
        .ids()
        .into_iter()
        .enumerate()
        .step_by(stride)
    {
        let next = patches.len() + 1;
        patches.push(Patch::set(
            next.to_string(),
            TargetSpec::by_id(id),
            "Address",
            format!("game.exe+{:X}", 0x8000 + n * 4),
        ));
        patches.push(Patch::set(
            (next + 1).to_string(),
            TargetSpec::by_id(id),
            "Active",
            true,
        ));
    }
    PatchSet::new(patches)
}

/// Flips `Active` and rewrites the value of every `stride`-th record in place.
pub fn touch_every(store: &mut MemoryRecordStore, stride: usize) {
    let ids: Vec<RecordId> = store.ids();
    for id in ids.into_iter().step_by(stride.max(1)) {
        if let Some(record) = store.record_mut(id) {
            record.active = !record.active;
            record.value = Number::Float(1.5);
        }
    }
}
