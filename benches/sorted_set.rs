//! Criterion benchmarks for the sorted set (hash map + AVL tree composition).
//!
//! Run with:
//!   cargo bench --bench sorted_set

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tinykv::sorted_set::SortedSet;

fn members(n: usize) -> Vec<(Vec<u8>, f64)> {
    (0..n)
        .map(|i| (format!("member-{i:08}").into_bytes(), (i % 997) as f64))
        .collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("sorted_set_insert");
    for &n in &[1_000usize, 10_000, 100_000] {
        let ms = members(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("insert", n), &ms, |b, ms| {
            b.iter(|| {
                let mut s = SortedSet::new();
                for (name, score) in ms {
                    s.insert(name.clone(), *score);
                }
                s
            })
        });
    }
    group.finish();
}

fn bench_query_from(c: &mut Criterion) {
    let mut group = c.benchmark_group("sorted_set_query_from");
    for &n in &[1_000usize, 10_000, 100_000] {
        let ms = members(n);
        let mut s = SortedSet::new();
        for (name, score) in &ms {
            s.insert(name.clone(), *score);
        }

        group.throughput(Throughput::Elements(100));
        group.bench_function(BenchmarkId::new("query_from", n), |b| {
            b.iter(|| criterion::black_box(s.query_from(500.0, b"member", 100)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_query_from);
criterion_main!(benches);
