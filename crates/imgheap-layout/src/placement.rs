//! Object placement records.
//!
//! A [`Placement`] records where one object ended up: its partition,
//! chunk and absolute offset. It is created once per object during
//! layout and never changes afterwards.

use std::fmt;

use imgheap_core::{ChunkId, ObjectId, PartitionKind};

/// Final location of one object in the image heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct Placement {
    object: ObjectId,
    partition: PartitionKind,
    chunk: ChunkId,
    offset: u64,
}

impl Placement {
    pub(crate) fn new(object: ObjectId, partition: PartitionKind, chunk: ChunkId, offset: u64) -> Self {
        Self {
            object,
            partition,
            chunk,
            offset,
        }
    }

    /// The placed object.
    pub fn object(&self) -> ObjectId {
        self.object
    }

    /// Partition that owns the object.
    pub fn partition(&self) -> PartitionKind {
        self.partition
    }

    /// Chunk that holds the object.
    pub fn chunk(&self) -> ChunkId {
        self.chunk
    }

    /// Absolute offset of the object's first byte in the layout.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Placement(obj={}, {}, chunk={}, off={:#x})",
            self.object, self.partition, self.chunk, self.offset
        )
    }
}
