//! Criterion benchmarks for the progressive-rehash hash map.
//!
//! Run with:
//!   cargo bench --bench hashmap

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tinykv::hashmap::HashMap;

fn keys(n: usize) -> Vec<Vec<u8>> {
    (0..n).map(|i| format!("key-{i:08}").into_bytes()).collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashmap_insert");
    for &n in &[1_000usize, 10_000, 100_000] {
        let ks = keys(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("insert", n), &ks, |b, ks| {
            b.iter(|| {
                let mut m = HashMap::new();
                for k in ks {
                    m.insert(k.clone(), 0u64);
                }
                m
            })
        });
    }
    group.finish();
}

fn bench_lookup_during_rehash(c: &mut Criterion) {
    let mut group = c.benchmark_group("hashmap_lookup_during_rehash");
    for &n in &[1_000usize, 10_000] {
        let ks = keys(n);
        let mut m = HashMap::new();
        for k in &ks {
            m.insert(k.clone(), 0u64);
        }
        // Trigger one more resize so a lookup benchmark runs while `older`
        // is still being drained.
        m.insert(b"trigger".to_vec(), 0);

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("lookup", n), &ks, |b, ks| {
            b.iter(|| {
                for k in ks {
                    criterion::black_box(m.lookup(k));
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_lookup_during_rehash);
criterion_main!(benches);
