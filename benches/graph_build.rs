//! Performance benchmarks for graph construction.
//!
//! Run with: `cargo bench --bench graph_build`
//!
//! ## Scenarios
//!
//! | Operation | Notes |
//! |-----------|-------|
//! | Object graph, chain | One entity per level, linked by property |
//! | Object graph, fan-out | One root, N entities in a list |
//! | Collections graph | Top-level list of N entities |
//! | Classification | Cached vs uncached registry lookups |

use criterion::{
    black_box, criterion_group, criterion_main,
    BenchmarkId, Criterion, Throughput,
};

use object_graph_kernel::{
    CacheConfig, InMemoryTypeRegistry, LiveGraphFactory, ManagedClass, ObjectRef,
    TypeMapper, TypeSignature, Value,
};

fn make_registry(cache: CacheConfig) -> InMemoryTypeRegistry {
    let mut registry = InMemoryTypeRegistry::with_cache(cache);
    registry.register_entity(
        ManagedClass::new("Customer")
            .with_id_property("id")
            .with_property("id", TypeSignature::class("long"))
            .with_property("next", TypeSignature::class("Customer"))
            .with_property("contacts", TypeSignature::parse("List<Customer>").unwrap()),
    );
    registry
}

/// Chain of `len` customers, each pointing at the next.
fn make_chain(len: usize) -> ObjectRef {
    let root = ObjectRef::new("Customer").with("id", 0i64);
    let mut tail = root.clone();
    for i in 1..len {
        let next = ObjectRef::new("Customer").with("id", i as i64);
        tail.set("next", &next);
        tail = next;
    }
    root
}

/// Root customer with `len` contacts.
fn make_fan_out(len: usize) -> ObjectRef {
    let contacts = (1..=len).map(|i| Value::from(ObjectRef::new("Customer").with("id", i as i64)));
    ObjectRef::new("Customer").with("id", 0i64).with("contacts", Value::list(contacts))
}

/// Benchmark object graph build over a chain.
fn bench_chain(c: &mut Criterion) {
    let factory = LiveGraphFactory::with_registry(make_registry(CacheConfig::default()));
    let mut group = c.benchmark_group("object_graph_chain");

    for len in [10, 100, 500] {
        let root = Value::from(make_chain(len));

        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("nodes", len), &root, |b, root| {
            b.iter(|| factory.create_live_graph(black_box(root)).unwrap())
        });
    }

    group.finish();
}

/// Benchmark object graph build over a fan-out list.
fn bench_fan_out(c: &mut Criterion) {
    let factory = LiveGraphFactory::with_registry(make_registry(CacheConfig::default()));
    let mut group = c.benchmark_group("object_graph_fan_out");

    for len in [10, 100, 1000] {
        let root = Value::from(make_fan_out(len));

        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("elements", len), &root, |b, root| {
            b.iter(|| factory.create_live_graph(black_box(root)).unwrap())
        });
    }

    group.finish();
}

/// Benchmark collections graph build over a top-level list.
fn bench_collections(c: &mut Criterion) {
    let factory = LiveGraphFactory::with_registry(make_registry(CacheConfig::default()));
    let mut group = c.benchmark_group("collections_graph");

    for len in [10, 100, 1000] {
        let list = Value::list(
            (0..len).map(|i| Value::from(ObjectRef::new("Customer").with("id", i as i64))),
        );

        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("elements", len), &list, |b, list| {
            b.iter(|| factory.create_collections_graph(black_box(list), None).unwrap())
        });
    }

    group.finish();
}

/// Benchmark classification with and without the LRU cache.
fn bench_classification(c: &mut Criterion) {
    let signature = TypeSignature::parse("List<Customer>").unwrap();
    let mut group = c.benchmark_group("classification");

    let cached = make_registry(CacheConfig::default());
    cached.classify(&signature);
    group.bench_function("cached", |b| b.iter(|| cached.classify(black_box(&signature))));

    let uncached = make_registry(CacheConfig::disabled());
    group.bench_function("uncached", |b| b.iter(|| uncached.classify(black_box(&signature))));

    group.finish();
}

criterion_group!(
    benches,
    bench_chain,
    bench_fan_out,
    bench_collections,
    bench_classification,
);
criterion_main!(benches);
