//! Reusable configurations and heaps.
//!
//! - [`packing_config`]: no header reserve, objects start at chunk offset 0.
//! - [`abi_config`]: small chunks with real header reserves.
//! - [`mixed_heap`]: a deterministic heap touching all seven partitions.

use imgheap_layout::{HeapPolicy, LayoutConfig};

use crate::MockImageHeap;

/// Chunk size and threshold for pure packing tests, with no header
/// space so object offsets are easy to predict.
pub fn packing_config(chunk_size: u64, threshold: u64) -> LayoutConfig {
    let policy = HeapPolicy::new(chunk_size, threshold).expect("valid test policy");
    LayoutConfig::unreserved(policy)
}

/// 4 KiB chunks, 512-byte huge threshold, 64-byte cards, and header
/// reserves large enough for the chunk-header ABI.
pub fn abi_config() -> LayoutConfig {
    let policy = HeapPolicy::new(4096, 512).expect("valid test policy");
    let mut config = LayoutConfig::new(policy);
    config.card_size = 64;
    // 40 header bytes + 64 cards.
    config.aligned_header_size = 104;
    config
}

/// A heap with `n` objects cycling through every partition.
///
/// Sizes come from a fixed pattern so runs are reproducible. Every
/// sixth object is huge relative to `threshold`; the rest stay below it.
/// Every thirteenth object is followed by a type descriptor.
pub fn mixed_heap(n: u32, threshold: u64) -> MockImageHeap {
    let mut heap = MockImageHeap::new();
    for i in 0..n {
        let size = if i % 6 == 5 {
            threshold + u64::from(i % 7) * 8
        } else {
            (8 + u64::from(i * 37 % 97) * 2).min(threshold - 8)
        };
        heap.push(size, |object| match i % 5 {
            0 => object,
            1 => object.with_references(),
            2 => object.relocatable(),
            3 => object.writable(),
            _ => object.writable().with_references(),
        });
        if i % 13 == 0 {
            heap.push_type_descriptor(16);
        }
    }
    heap
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgheap_core::{ImageHeap, PartitionKind};

    #[test]
    fn mixed_heap_reaches_every_partition() {
        let heap = mixed_heap(100, 64);
        for kind in PartitionKind::ALL {
            assert!(
                heap.objects().iter().any(|o| PartitionKind::classify(o, 64) == kind),
                "no object for {kind}"
            );
        }
        assert_eq!(heap.type_descriptor_count(), 8);
    }

    #[test]
    fn abi_config_is_valid() {
        assert!(abi_config().validate().is_ok());
        assert!(packing_config(64, 64).validate().is_ok());
    }
}
