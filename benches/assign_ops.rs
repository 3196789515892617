//! Benchmarks for view assignment comparing Scalar vs SSE2 vs AVX2 backends
//!
//! # Benchmark Methodology
//!
//! - Tests multiple view sizes: 100, 1000, 10000 elements
//! - Views start at offset 3 of their parent, so the tail and misaligned
//!   starts are part of every measurement
//! - Compares Scalar, SSE2, and AVX2 backends explicitly
//! - Uses Criterion for statistical analysis
//! - Each benchmark measures throughput (elements/second)
//!
//! # Performance Goals
//!
//! - Vectorized `f32` assignment: 3-4x over Scalar on SSE2, ~2x more on AVX2
//! - Overlapping sources pay for one temporary, no more
//! - Streaming assignment beats plain stores once the target exceeds the cache

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use subvec::{Backend, CompressedVector, DynamicVector, EngineConfig, OperandExt};

const OFFSET: usize = 3;

/// Generate test data for benchmarks
fn generate_test_data(size: usize) -> Vec<f32> {
    (0..size).map(|i| (i as f32) * 0.5).collect()
}

fn bench_backends() -> Vec<(&'static str, Backend)> {
    let mut list = vec![("Scalar", Backend::Scalar)];
    #[cfg(target_arch = "x86_64")]
    {
        list.push(("SSE2", Backend::SSE2));
        if is_x86_feature_detected!("avx2") {
            list.push(("AVX2", Backend::AVX2));
        }
    }
    list
}

/// Benchmark `view += dense`
fn bench_add_assign(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_add_assign");

    for size in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));

        for (name, backend) in bench_backends() {
            group.bench_with_input(BenchmarkId::new(name, size), size, |bencher, &size| {
                let parent = DynamicVector::from_slice_with_backend(
                    &generate_test_data(size + OFFSET),
                    backend,
                );
                let src = DynamicVector::from_slice(&generate_test_data(size));
                let view = parent.subvector(OFFSET, size).unwrap();

                bencher.iter(|| {
                    view.add_assign(black_box(&src)).unwrap();
                });
            });
        }
    }

    group.finish();
}

/// Benchmark `view = a + b * 2` (fused expression)
fn bench_fused_expression(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_fused_expression");

    for size in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));

        for (name, backend) in bench_backends() {
            group.bench_with_input(BenchmarkId::new(name, size), size, |bencher, &size| {
                let data = generate_test_data(size);
                let parent = DynamicVector::zeros_with_config(
                    size + OFFSET,
                    EngineConfig::new().with_backend(backend),
                );
                let a = DynamicVector::from_slice_with_backend(&data, backend);
                let b = DynamicVector::from_slice_with_backend(&data, backend);
                let view = parent.subvector(OFFSET, size).unwrap();

                bencher.iter(|| {
                    let expr = (&a).add((&b).mul_scalar(2.0)).unwrap();
                    view.assign(black_box(expr)).unwrap();
                });
            });
        }
    }

    group.finish();
}

/// Benchmark overlapping self-read (forces one temporary)
fn bench_overlapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_overlapping_assign");

    for size in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("Auto", size), size, |bencher, &size| {
            let parent = DynamicVector::from_slice(&generate_test_data(size + OFFSET));

            bencher.iter(|| {
                let dst = parent.subvector(0, size).unwrap();
                dst.assign(black_box(parent.subvector(OFFSET, size).unwrap()))
                    .unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark sparse `view *= sparse` (snapshot, reset, scatter)
fn bench_sparse_mul(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_sparse_mul_assign");

    for size in [100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("1pct", size), size, |bencher, &size| {
            let pairs: Vec<(usize, f32)> = (0..size).step_by(100).map(|i| (i, 1.5)).collect();
            let sparse = CompressedVector::from_pairs(size, &pairs).unwrap();
            let parent = DynamicVector::from_slice(&generate_test_data(size));

            bencher.iter(|| {
                parent.mul_assign(black_box(&sparse)).unwrap();
            });
        });
    }

    group.finish();
}

/// Benchmark streaming vs plain stores for a large plain assignment
fn bench_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("view_large_assign");
    let size = 4 * 1024 * 1024;
    group.throughput(Throughput::Elements(size as u64));
    group.sample_size(20);

    let src = DynamicVector::from_slice(&generate_test_data(size));
    for (name, streaming) in [("plain", false), ("streaming", true)] {
        group.bench_function(name, |bencher| {
            let parent =
                DynamicVector::zeros_with_config(size, EngineConfig::new().with_streaming(streaming));

            bencher.iter(|| {
                parent.assign(black_box(&src)).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_add_assign,
    bench_fused_expression,
    bench_overlapping,
    bench_sparse_mul,
    bench_streaming
);
criterion_main!(benches);
