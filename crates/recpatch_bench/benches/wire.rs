//! Wire and table format benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use recpatch_bench::{grouped_store, record_count, sparse_patches};
use recpatch_core::record::{from_table, to_table, TableEntry};
use recpatch_sync_protocol::PatchResponse;

/// Benchmark encoding and decoding patch responses.
fn bench_response(c: &mut Criterion) {
    let mut group = c.benchmark_group("response");
    let store = grouped_store(50, 20);

    for stride in [1usize, 10, 100].iter() {
        let set = sparse_patches(&store, *stride);
        let response = PatchResponse::from_patch_set("2.0.0", &set);
        let bytes = response.encode().unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("encode", set.len()), &response, |b, r| {
            b.iter(|| {
                let encoded = black_box(r).encode().unwrap();
                black_box(encoded);
            });
        });

        group.bench_with_input(BenchmarkId::new("decode", set.len()), &bytes, |b, bytes| {
            b.iter(|| {
                let decoded = PatchResponse::decode(black_box(bytes)).unwrap();
                let set = decoded.to_patch_set().unwrap();
                black_box(set);
            });
        });
    }
    group.finish();
}

/// Benchmark loading and saving record tables.
fn bench_table(c: &mut Criterion) {
    let mut group = c.benchmark_group("table");

    for (groups, width) in [(10usize, 10usize), (100, 100)].iter() {
        let count = record_count(*groups, *width);
        let store = grouped_store(*groups, *width);
        let json = serde_json::to_vec(&to_table(&store)).unwrap();
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("save", count), &store, |b, store| {
            b.iter(|| {
                let bytes = serde_json::to_vec(&to_table(black_box(store))).unwrap();
                black_box(bytes);
            });
        });

        group.bench_with_input(BenchmarkId::new("load", count), &json, |b, json| {
            b.iter(|| {
                let entries: Vec<TableEntry> = serde_json::from_slice(black_box(json)).unwrap();
                let store = from_table(entries).unwrap();
                black_box(store);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_response, bench_table);

criterion_main!(benches);
