//! Image heap partitions.
//!
//! A [`Partition`] is one homogeneous bucket of objects. It is filled by
//! graph discovery, laid out exactly once against the shared allocator,
//! and afterwards only reports where its objects went.

use imgheap_core::{ImageObject, ObjectId, PartitionKind};
use log::debug;

use crate::allocator::ChunkAllocator;
use crate::error::LayoutError;
use crate::info::PartitionBoundary;
use crate::placement::Placement;

/// One partition of the image heap and its layout results.
#[derive(Clone, Debug)]
pub struct Partition {
    kind: PartitionKind,
    /// Objects queued for layout, in discovery order.
    objects: Vec<ImageObject>,
    placements: Vec<Placement>,
    first_object: Option<ObjectId>,
    last_object: Option<ObjectId>,
    start_offset: u64,
    end_offset: u64,
    laid_out: bool,
}

impl Partition {
    /// Create an empty partition.
    pub fn new(kind: PartitionKind) -> Self {
        Self {
            kind,
            objects: Vec::new(),
            placements: Vec::new(),
            first_object: None,
            last_object: None,
            start_offset: 0,
            end_offset: 0,
            laid_out: false,
        }
    }

    /// Which partition this is.
    pub fn kind(&self) -> PartitionKind {
        self.kind
    }

    /// Partition name.
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Whether objects here may be written after load.
    pub fn is_writable(&self) -> bool {
        self.kind.is_writable()
    }

    /// Whether every object here takes its own unaligned chunk.
    pub fn holds_huge_objects(&self) -> bool {
        self.kind.holds_huge_objects()
    }

    /// Whether objects here may carry references. Informational.
    pub fn contains_references(&self) -> bool {
        self.kind.contains_references()
    }

    /// Queue an object for layout.
    pub fn add(&mut self, object: ImageObject) -> Result<(), LayoutError> {
        if self.laid_out {
            return Err(LayoutError::PartitionReused { partition: self.kind });
        }
        self.objects.push(object);
        Ok(())
    }

    /// Objects in layout order.
    pub fn objects(&self) -> &[ImageObject] {
        &self.objects
    }

    /// Place every queued object, in order, through `allocator`.
    ///
    /// Callable once; a second call is [`LayoutError::PartitionReused`].
    /// A huge partition first closes its class's open aligned chunk and
    /// moves to a chunk boundary, so that every partition occupies one
    /// contiguous address range.
    pub fn layout(&mut self, allocator: &mut ChunkAllocator) -> Result<(), LayoutError> {
        if self.laid_out {
            return Err(LayoutError::PartitionReused { partition: self.kind });
        }
        self.laid_out = true;

        let writability = self.kind.writability();
        let huge = self.kind.holds_huge_objects();
        if huge && !self.objects.is_empty() {
            allocator.finish_aligned_chunk(writability);
            allocator.align_to_chunk_boundary()?;
        }

        let reserved_start = allocator.next_position(writability, huge);
        self.placements.reserve(self.objects.len());
        for object in &self.objects {
            let placement = allocator.place_object(self.kind, object)?;
            self.first_object.get_or_insert(object.id);
            self.last_object = Some(object.id);
            self.placements.push(placement);
        }

        match self.placements.first() {
            Some(first) => {
                self.start_offset = first.offset();
                self.end_offset = allocator.next_position(writability, huge);
            }
            None => {
                self.start_offset = reserved_start;
                self.end_offset = reserved_start;
            }
        }
        debug!(
            "laid out {}: {} objects in [{:#x}, {:#x})",
            self.kind,
            self.placements.len(),
            self.start_offset,
            self.end_offset
        );
        Ok(())
    }

    /// Placements in layout order.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// First object placed, if any.
    pub fn first_object(&self) -> Option<ObjectId> {
        self.first_object
    }

    /// Last object placed, if any.
    pub fn last_object(&self) -> Option<ObjectId> {
        self.last_object
    }

    /// `(first, last)` pair for the heap-info summary.
    pub fn boundary(&self) -> PartitionBoundary {
        PartitionBoundary {
            first: self.first_object,
            last: self.last_object,
        }
    }

    /// Offset of the first object, or for an empty partition the offset
    /// its first object would have started at.
    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    /// Offset one past the partition's last used byte.
    pub fn end_offset(&self) -> u64 {
        self.end_offset
    }

    /// Bytes spanned by the partition, including alignment padding.
    pub fn size(&self) -> u64 {
        self.end_offset - self.start_offset
    }
}
