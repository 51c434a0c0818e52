//! Benchmark profiles for image heap layout.
//!
//! - [`reference_profile`]: 1 MiB chunks, 10K objects, a few huge ones
//! - [`stress_profile`]: 64 KiB chunks, 200K objects, many chunk turnovers

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use imgheap_core::ImageObject;
use imgheap_layout::{HeapPolicy, LayoutConfig};
use imgheap_test_utils::MockImageHeap;

/// Default configuration and a 10K-object heap.
///
/// One object in 500 is huge (just over the 128 KiB threshold).
pub fn reference_profile() -> (LayoutConfig, MockImageHeap) {
    let config = LayoutConfig::default();
    let heap = profile_heap(10_000, 500, config.huge_object_threshold());
    (config, heap)
}

/// 64 KiB chunks with an 8 KiB threshold and a 200K-object heap.
pub fn stress_profile() -> (LayoutConfig, MockImageHeap) {
    let policy = HeapPolicy::new(64 << 10, 8 << 10).unwrap();
    let config = LayoutConfig::new(policy);
    let heap = profile_heap(200_000, 1_000, config.huge_object_threshold());
    (config, heap)
}

/// `n` objects spread over all partitions; every `huge_every`-th is huge.
fn profile_heap(n: u32, huge_every: u32, threshold: u64) -> MockImageHeap {
    let mut heap = MockImageHeap::new();
    for i in 0..n {
        let size = if i % huge_every == huge_every - 1 {
            threshold + 64
        } else {
            16 + u64::from(i.wrapping_mul(2_654_435_761) % 1_000)
        };
        heap.push(size, |object| match i % 8 {
            0..=2 => object,
            3 | 4 => object.with_references(),
            5 => object.relocatable(),
            6 => object.writable(),
            _ => object.writable().with_references(),
        });
        if i % 50 == 0 {
            heap.push_type_descriptor(64);
        }
    }
    heap
}

/// A single object of `size` bytes, for micro-benchmarks of one placement.
pub fn object(id: u32, size: u64) -> ImageObject {
    ImageObject::new(id, size)
}
