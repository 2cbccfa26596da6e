//! Build and search throughput for the pyramid index.
//!
//! Key questions:
//! - How does build time scale with the number of partitions?
//! - How much does parallel local-index construction buy?
//! - How does query latency move with fan_out?

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pyramid::{PyramidIndex, PyramidParams};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::hint::black_box;

fn create_dataset(n: usize, dim: usize, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n * dim).map(|_| rng.random::<f32>()).collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("pyramid_build");
    group.sample_size(10);

    let (n, dim) = (5000, 64);
    let data = create_dataset(n, dim, 42);
    group.throughput(Throughput::Elements(n as u64));

    for partitions in [4, 16, 64] {
        for parallel in [false, true] {
            let label = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(
                BenchmarkId::new(label, partitions),
                &partitions,
                |b, &partitions| {
                    b.iter(|| {
                        let params =
                            PyramidParams::new(dim, partitions).with_parallel_build(parallel);
                        let mut index = PyramidIndex::new(params).expect("params");
                        index.build(black_box(&data), n).expect("build");
                        index
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("pyramid_search");

    let (n, dim, k) = (10_000, 64, 10);
    let data = create_dataset(n, dim, 42);
    let queries = create_dataset(100, dim, 123);

    let params = PyramidParams::new(dim, 32).with_parallel_build(true);
    let mut index = PyramidIndex::new(params).expect("params");
    index.build(&data, n).expect("build");

    group.throughput(Throughput::Elements(100));
    for fan_out in [1, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("fan_out", fan_out),
            &fan_out,
            |b, &fan_out| {
                b.iter(|| {
                    for q in queries.chunks_exact(dim) {
                        black_box(index.search_with_fan_out(black_box(q), k, fan_out));
                    }
                })
            },
        );
    }

    group.bench_function("batch_fan_out_2", |b| {
        b.iter(|| black_box(index.search_batch(black_box(&queries), k).expect("batch")))
    });

    group.finish();
}

criterion_group!(benches, bench_build, bench_search);
criterion_main!(benches);
