//! Throughput Benchmark for ShardKV
//!
//! This benchmark measures the performance of the store and snapshot
//! pipeline under various workloads.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shardkv::Store;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let store = Store::new(16);

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            store.set(format!("key:{}", i), "small_value", None).unwrap();
            i += 1;
        });
    });

    group.bench_function("set_medium", |b| {
        let mut i = 0u64;
        let value = Bytes::from("x".repeat(1024)); // 1KB value
        b.iter(|| {
            store.set(format!("key:{}", i), &value, None).unwrap();
            i += 1;
        });
    });

    group.bench_function("set_with_ttl", |b| {
        let mut i = 0u64;
        b.iter(|| {
            store
                .set(format!("ttl:{}", i), "value", Some(Duration::from_secs(60)))
                .unwrap();
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let store = Store::new(16);

    // Pre-populate with data
    for i in 0..100_000 {
        store
            .set(format!("key:{}", i), &format!("value:{}", i), Some(Duration::from_secs(3600)))
            .unwrap();
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(store.get(&format!("key:{}", i % 100_000)));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(store.get(&format!("missing:{}", i)));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark parallel writers at different shard counts
fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("contention");
    let threads = 4;
    let per_thread = 10_000;
    group.throughput(Throughput::Elements((threads * per_thread) as u64));

    for shards in [1usize, 16, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(shards), &shards, |b, &shards| {
            b.iter(|| {
                let store = Arc::new(Store::new(shards));
                let handles: Vec<_> = (0..threads)
                    .map(|t| {
                        let store = Arc::clone(&store);
                        thread::spawn(move || {
                            for i in 0..per_thread {
                                store.set(format!("t{}:{}", t, i), &(i as i64), None).unwrap();
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
    }

    group.finish();
}

/// Benchmark snapshot save and load
fn bench_snapshot(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bench.snap");

    let store = Store::new(16);
    for i in 0..50_000 {
        store.set(format!("kv_{}", i), &format!("val_{}", i), None).unwrap();
    }

    let mut group = c.benchmark_group("snapshot");
    group.sample_size(10);
    group.throughput(Throughput::Elements(50_000));

    group.bench_function("save_50k", |b| {
        b.iter(|| store.save(&path).unwrap());
    });

    group.bench_function("load_50k", |b| {
        b.iter(|| {
            let fresh = Store::new(16);
            black_box(fresh.load(&path).unwrap())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_set, bench_get, bench_contention, bench_snapshot);
criterion_main!(benches);
