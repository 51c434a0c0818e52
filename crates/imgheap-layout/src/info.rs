//! Records published once layout finishes.
//!
//! [`HeapInfo`] is what the runtime bootstrap reads to initialise its
//! heap-range bookkeeping. [`LayoutInfo`] is what the image writer needs
//! to size the image and protect its read-only part.

use indexmap::IndexMap;

use imgheap_core::{ObjectId, PartitionKind};

/// First and last object placed by one partition.
///
/// Both are `None` for a partition that placed nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PartitionBoundary {
    /// Earliest placement.
    pub first: Option<ObjectId>,
    /// Most recent placement.
    pub last: Option<ObjectId>,
}

impl PartitionBoundary {
    /// Whether the partition placed nothing.
    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }
}

/// Heap-range summary for the runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeapInfo {
    boundaries: IndexMap<PartitionKind, PartitionBoundary>,
    writable_begin: u64,
    first_writable_unaligned_chunk: Option<u64>,
    type_descriptor_count: usize,
}

impl HeapInfo {
    pub(crate) fn new(
        boundaries: IndexMap<PartitionKind, PartitionBoundary>,
        writable_begin: u64,
        first_writable_unaligned_chunk: Option<u64>,
        type_descriptor_count: usize,
    ) -> Self {
        Self {
            boundaries,
            writable_begin,
            first_writable_unaligned_chunk,
            type_descriptor_count,
        }
    }

    /// Boundary pair of `kind`.
    pub fn boundary(&self, kind: PartitionKind) -> PartitionBoundary {
        self.boundaries.get(&kind).copied().unwrap_or_default()
    }

    /// All boundary pairs, in canonical partition order.
    pub fn boundaries(&self) -> impl Iterator<Item = (PartitionKind, PartitionBoundary)> + '_ {
        self.boundaries.iter().map(|(&k, &b)| (k, b))
    }

    /// Lowest address of the writable region.
    pub fn writable_begin(&self) -> u64 {
        self.writable_begin
    }

    /// Begin offset of the lowest writable unaligned chunk.
    pub fn first_writable_unaligned_chunk(&self) -> Option<u64> {
        self.first_writable_unaligned_chunk
    }

    /// Number of type-descriptor objects in the heap.
    pub fn type_descriptor_count(&self) -> usize {
        self.type_descriptor_count
    }
}

/// Offsets and sizes the image-writing stage works from.
///
/// All offsets are absolute in the layout address space; the image
/// buffer starts at `start_offset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutInfo {
    /// First byte of the image heap.
    pub start_offset: u64,
    /// First byte of the writable region.
    pub writable_begin: u64,
    /// Bytes from `writable_begin` to the end of the image.
    pub writable_size: u64,
    /// First byte of the read-only relocatable partition.
    pub read_only_relocatable_begin: u64,
    /// Bytes spanned by the read-only relocatable partition.
    pub read_only_relocatable_size: u64,
    /// Bytes from `start_offset` to the end of the last chunk.
    pub image_size: u64,
}

impl LayoutInfo {
    /// Offset one past the last byte of the image.
    pub fn image_end(&self) -> u64 {
        self.start_offset + self.image_size
    }

    /// Bytes before `writable_begin`, which can be mapped read-only.
    pub fn read_only_size(&self) -> u64 {
        self.writable_begin.min(self.image_end()) - self.start_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_partition_reads_as_empty() {
        let info = HeapInfo::new(IndexMap::new(), 64, None, 3);
        assert!(info.boundary(PartitionKind::ReadOnlyHuge).is_empty());
        assert_eq!(info.type_descriptor_count(), 3);
    }

    #[test]
    fn read_only_size_clamps_to_image() {
        let info = LayoutInfo {
            start_offset: 0,
            writable_begin: 128,
            writable_size: 0,
            read_only_relocatable_begin: 0,
            read_only_relocatable_size: 0,
            image_size: 64,
        };
        assert_eq!(info.image_end(), 64);
        assert_eq!(info.read_only_size(), 64);
    }
}
