//! Refinement benchmarks over inverter rings of growing size.
//!
//! Rings are the worst case for pure refinement: every vertex looks like
//! every other until a forced match breaks the symmetry, so these exercise
//! value recomputation, bucketing, section matching, and the guess path
//! together.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use netmatch_core::Engine;

/// Builds both graphs as identical inverter rings of `n` devices.
fn ring_engine(n: usize) -> Engine {
    let mut engine = Engine::new();
    engine
        .define_device_master("inv", &["in", "out"])
        .expect("master registers");
    for graph in 0..2 {
        for i in 0..n {
            let input = format!("n{}", i);
            let output = format!("n{}", (i + 1) % n);
            engine
                .define_device_vertex(graph, "inv", &format!("u{}", i), &[input.as_str(), output.as_str()])
                .expect("device inserts");
        }
    }
    engine
}

/// Builds both graphs as identical chains, which refinement resolves
/// without guessing.
fn chain_engine(n: usize) -> Engine {
    let mut engine = Engine::new();
    engine
        .define_device_master("inv", &["in", "out"])
        .expect("master registers");
    for graph in 0..2 {
        for i in 0..n {
            let input = format!("n{}", i);
            let output = format!("n{}", i + 1);
            engine
                .define_device_vertex(graph, "inv", &format!("u{}", i), &[input.as_str(), output.as_str()])
                .expect("device inserts");
        }
    }
    engine
}

fn bench_symmetric_rings(c: &mut Criterion) {
    let mut group = c.benchmark_group("symmetric_ring");
    for &size in &[8usize, 32, 128] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || ring_engine(size),
                |mut engine| {
                    let outcome = engine.execute().expect("run completes");
                    assert!(outcome.matched);
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_chains(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain");
    for &size in &[8usize, 64, 256] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || chain_engine(size),
                |mut engine| {
                    let outcome = engine.execute().expect("run completes");
                    assert!(outcome.matched);
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_symmetric_rings, bench_chains);
criterion_main!(benches);
