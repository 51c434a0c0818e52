//! Layout orchestration.
//!
//! [`ImageHeapLayouter`] collects objects into partitions, then lays the
//! partitions out in canonical order (every read-only partition before
//! any writable one) against a single [`ChunkAllocator`]. The result is
//! an immutable [`ImageHeapLayout`].

use indexmap::IndexMap;
use log::info;

use imgheap_core::{ImageHeap, ImageObject, ObjectId, PartitionKind};

use crate::allocator::{ChunkAllocator, ChunkTable};
use crate::config::{ConfigError, LayoutConfig};
use crate::error::{LayoutError, RequestFault};
use crate::header::HeaderShape;
use crate::info::{HeapInfo, LayoutInfo};
use crate::partition::Partition;
use crate::placement::Placement;
use crate::writer::{write_chunk_headers, ChunkWriter};

/// Assigns objects to partitions and runs one layout.
#[derive(Debug)]
pub struct ImageHeapLayouter {
    config: LayoutConfig,
    /// One entry per [`PartitionKind`], in canonical order.
    partitions: IndexMap<PartitionKind, Partition>,
    assignments: IndexMap<ObjectId, PartitionKind>,
}

impl ImageHeapLayouter {
    /// Create a layouter with seven empty partitions.
    pub fn new(config: LayoutConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let partitions = PartitionKind::ALL
            .iter()
            .map(|&kind| (kind, Partition::new(kind)))
            .collect();
        Ok(Self {
            config,
            partitions,
            assignments: IndexMap::new(),
        })
    }

    /// The validated configuration.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Partition of `kind`.
    pub fn partition(&self, kind: PartitionKind) -> &Partition {
        &self.partitions[&kind]
    }

    /// Number of objects assigned so far.
    pub fn object_count(&self) -> usize {
        self.assignments.len()
    }

    /// Classify `object` and queue it in its partition.
    pub fn assign(&mut self, object: ImageObject) -> Result<PartitionKind, LayoutError> {
        if self.assignments.contains_key(&object.id) {
            return Err(LayoutError::InvalidLayoutRequest {
                object: object.id,
                fault: RequestFault::DuplicateObject,
            });
        }
        let kind = PartitionKind::classify(&object, self.config.huge_object_threshold());
        let id = object.id;
        self.partitions[&kind].add(object)?;
        self.assignments.insert(id, kind);
        Ok(kind)
    }

    /// Assign every object `heap` provides, in its order.
    pub fn assign_all(&mut self, heap: &dyn ImageHeap) -> Result<(), LayoutError> {
        for object in heap.objects() {
            self.assign(object.clone())?;
        }
        Ok(())
    }

    /// Lay out every partition and derive the heap boundaries.
    pub fn layout(mut self, type_descriptor_count: usize) -> Result<ImageHeapLayout, LayoutError> {
        let mut allocator = ChunkAllocator::new(&self.config)?;
        for partition in self.partitions.values_mut() {
            partition.layout(&mut allocator)?;
        }
        let image_end = allocator.position();
        let chunks = allocator.into_chunks();

        let writable_primitive = &self.partitions[&PartitionKind::WritablePrimitive];
        let mut writable_begin = writable_primitive.start_offset();
        // Chunks are in address order, so the first writable one is the lowest.
        if let Some(chunk) = chunks.aligned().find(|c| c.is_writable()) {
            writable_begin = writable_begin.min(chunk.begin());
        }
        let first_writable_unaligned_chunk = chunks
            .unaligned()
            .find(|c| c.is_writable())
            .map(|c| c.begin());

        let boundaries = self
            .partitions
            .iter()
            .map(|(&kind, p)| (kind, p.boundary()))
            .collect();
        let heap_info = HeapInfo::new(
            boundaries,
            writable_begin,
            first_writable_unaligned_chunk,
            type_descriptor_count,
        );

        let relocatable = &self.partitions[&PartitionKind::ReadOnlyRelocatable];
        let start_offset = self.config.start_offset;
        let layout_info = LayoutInfo {
            start_offset,
            writable_begin,
            writable_size: image_end.saturating_sub(writable_begin),
            read_only_relocatable_begin: relocatable.start_offset(),
            read_only_relocatable_size: relocatable.size(),
            image_size: image_end - start_offset,
        };

        let mut placements = IndexMap::with_capacity(self.assignments.len());
        for partition in self.partitions.values() {
            for placement in partition.placements() {
                placements.insert(placement.object(), *placement);
            }
        }

        info!(
            "image heap laid out: {} objects, {} aligned + {} unaligned chunks, \
             {} bytes, writable from {:#x}",
            placements.len(),
            chunks.aligned_ids().len(),
            chunks.unaligned_ids().len(),
            layout_info.image_size,
            writable_begin
        );

        Ok(ImageHeapLayout {
            config: self.config,
            partitions: self.partitions,
            placements,
            chunks,
            heap_info,
            layout_info,
        })
    }
}

/// A finished layout.
#[derive(Clone, Debug)]
pub struct ImageHeapLayout {
    config: LayoutConfig,
    partitions: IndexMap<PartitionKind, Partition>,
    placements: IndexMap<ObjectId, Placement>,
    chunks: ChunkTable,
    heap_info: HeapInfo,
    layout_info: LayoutInfo,
}

impl ImageHeapLayout {
    /// Configuration the layout was built with.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Partition of `kind`.
    pub fn partition(&self, kind: PartitionKind) -> &Partition {
        &self.partitions[&kind]
    }

    /// All partitions, in canonical order.
    pub fn partitions(&self) -> impl Iterator<Item = &Partition> + '_ {
        self.partitions.values()
    }

    /// All chunks.
    pub fn chunks(&self) -> &ChunkTable {
        &self.chunks
    }

    /// Heap-range summary for the runtime.
    pub fn heap_info(&self) -> &HeapInfo {
        &self.heap_info
    }

    /// Offsets and sizes for the image writer.
    pub fn layout_info(&self) -> &LayoutInfo {
        &self.layout_info
    }

    /// Where `object` was placed.
    pub fn placement(&self, object: ObjectId) -> Option<&Placement> {
        self.placements.get(&object)
    }

    /// Absolute offset of `object`.
    pub fn offset_of(&self, object: ObjectId) -> Option<u64> {
        self.placement(object).map(Placement::offset)
    }

    /// Every placement, partition by partition.
    pub fn placements(&self) -> impl Iterator<Item = &Placement> + '_ {
        self.placements.values()
    }

    /// Stamp every chunk header through `writer`.
    ///
    /// Fails with [`ConfigError::HeaderReserveTooSmall`] if the
    /// configuration reserved no header space.
    pub fn write_headers<W: ChunkWriter + ?Sized>(&self, writer: &mut W) -> Result<(), LayoutError> {
        let shape = HeaderShape::for_config(&self.config)?;
        write_chunk_headers(writer, &shape, &self.chunks)
    }
}
