//! Criterion benchmarks for partition assignment, packing and layout.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use imgheap_bench::{object, reference_profile, stress_profile};
use imgheap_core::{ImageHeap, PartitionKind};
use imgheap_layout::{ChunkAllocator, ImageHeapLayouter};

/// Benchmark: assign and lay out the 10K-object reference heap.
fn bench_layout_reference(c: &mut Criterion) {
    let (config, heap) = reference_profile();
    c.bench_function("layout_reference_10k", |b| {
        b.iter(|| {
            let mut layouter = ImageHeapLayouter::new(config.clone()).unwrap();
            layouter.assign_all(&heap).unwrap();
            black_box(layouter.layout(heap.type_descriptor_count()).unwrap());
        });
    });
}

/// Benchmark: assign and lay out the 200K-object stress heap.
fn bench_layout_stress(c: &mut Criterion) {
    let (config, heap) = stress_profile();
    let mut group = c.benchmark_group("layout_stress");
    group.sample_size(20);
    group.bench_function("layout_stress_200k", |b| {
        b.iter(|| {
            let mut layouter = ImageHeapLayouter::new(config.clone()).unwrap();
            layouter.assign_all(&heap).unwrap();
            black_box(layouter.layout(heap.type_descriptor_count()).unwrap());
        });
    });
    group.finish();
}

/// Benchmark: 10K direct placements into one partition's aligned chunks.
fn bench_place_small_objects(c: &mut Criterion) {
    let (config, _) = reference_profile();
    let objects: Vec<_> = (0..10_000).map(|i| object(i, 48)).collect();
    c.bench_function("place_small_10k", |b| {
        b.iter(|| {
            let mut allocator = ChunkAllocator::new(&config).unwrap();
            for obj in &objects {
                black_box(
                    allocator
                        .place_object(PartitionKind::WritablePrimitive, obj)
                        .unwrap(),
                );
            }
        });
    });
}

criterion_group!(
    benches,
    bench_layout_reference,
    bench_layout_stress,
    bench_place_small_objects
);
criterion_main!(benches);
