use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlmeta_cache::{CacheConfig, ObjectContainer, ObjectStore};
use sqlmeta_model::{ObjectPath, Table};
use std::sync::Arc;

fn loaded_store(size: usize, case_sensitive: bool) -> ObjectStore<Table> {
    let schema = ObjectPath::new(["public"]);
    let store = ObjectStore::new(
        "tables of public",
        &CacheConfig::default().with_case_sensitive(case_sensitive),
    );
    store.set_cache(
        (0..size)
            .map(|i| Arc::new(Table::new(&schema, format!("Table_{i:05}"))))
            .collect(),
    );
    store
}

fn benchmark_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_object");

    for size in [100usize, 10_000] {
        for case_sensitive in [false, true] {
            let store = loaded_store(size, case_sensitive);
            let name = format!("Table_{:05}", size / 2);
            let label = format!("{size}/{}", if case_sensitive { "exact" } else { "folded" });
            group.bench_with_input(BenchmarkId::from_parameter(label), &name, |b, name| {
                b.iter(|| store.cached_object(black_box(name)))
            });
        }
    }

    group.finish();
}

fn benchmark_snapshot(c: &mut Criterion) {
    let store = loaded_store(10_000, false);
    c.bench_function("cached_objects_snapshot", |b| {
        b.iter(|| black_box(store.cached_objects()))
    });
}

criterion_group!(benches, benchmark_lookup, benchmark_snapshot);
criterion_main!(benches);
