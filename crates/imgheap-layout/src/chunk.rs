//! Aligned and unaligned heap chunks.
//!
//! A [`Chunk`] is a contiguous range of the image with a bump pointer.
//! Aligned chunks have the configured power-of-two size, begin on a
//! multiple of it, and are filled with many objects of one writability
//! class. Unaligned chunks are sized to one huge object and are full the
//! moment they are created. Chunks are never split, merged or resized.

use imgheap_core::{ChunkId, ObjectId};

/// Round `value` up to a multiple of `alignment` (a power of two).
///
/// Returns `None` if the result does not fit in a `u64`.
pub fn align_up(value: u64, alignment: u64) -> Option<u64> {
    debug_assert!(alignment.is_power_of_two());
    let mask = alignment - 1;
    value.checked_add(mask).map(|v| v & !mask)
}

/// The two chunk shapes and their payloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChunkKind {
    /// Fixed-size chunk holding many objects in placement order.
    Aligned {
        /// Objects placed in this chunk, by ascending offset.
        objects: Vec<ObjectId>,
    },
    /// Chunk sized for exactly one huge object.
    Unaligned {
        /// The single object.
        object: ObjectId,
    },
}

impl ChunkKind {
    /// `"aligned"` or `"unaligned"`, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Aligned { .. } => "aligned",
            Self::Unaligned { .. } => "unaligned",
        }
    }
}

/// One chunk of the image heap.
///
/// Offsets (`begin`, `top`, `end`) are absolute positions in the layout
/// address space. The header fields written later use the relative
/// [`Chunk::top_offset`] and [`Chunk::end_offset`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    id: ChunkId,
    begin: u64,
    /// Bump pointer: next free byte.
    top: u64,
    end: u64,
    writable: bool,
    kind: ChunkKind,
}

impl Chunk {
    /// Open an empty aligned chunk covering `[begin, begin + size)` whose
    /// first `header_size` bytes are reserved.
    pub(crate) fn aligned(id: ChunkId, begin: u64, size: u64, header_size: u64, writable: bool) -> Self {
        Self {
            id,
            begin,
            top: begin + header_size,
            end: begin + size,
            writable,
            kind: ChunkKind::Aligned {
                objects: Vec::new(),
            },
        }
    }

    /// Create a closed unaligned chunk of `size` bytes holding `object`.
    pub(crate) fn unaligned(id: ChunkId, begin: u64, size: u64, object: ObjectId, writable: bool) -> Self {
        Self {
            id,
            begin,
            top: begin + size,
            end: begin + size,
            writable,
            kind: ChunkKind::Unaligned { object },
        }
    }

    /// Bump-allocate `size` bytes at `alignment` for `object`.
    ///
    /// Returns the absolute offset of the object, or `None` if the chunk
    /// is unaligned or has insufficient room left.
    pub(crate) fn allocate(&mut self, object: ObjectId, size: u64, alignment: u64) -> Option<u64> {
        let ChunkKind::Aligned { objects } = &mut self.kind else {
            return None;
        };
        let start = align_up(self.top, alignment)?;
        let new_top = start.checked_add(size)?;
        if new_top > self.end {
            return None;
        }
        self.top = new_top;
        objects.push(object);
        Some(start)
    }

    /// Identity and global rank of this chunk.
    pub fn id(&self) -> ChunkId {
        self.id
    }

    /// Absolute offset of the chunk's first byte.
    pub fn begin(&self) -> u64 {
        self.begin
    }

    /// Absolute offset of the first free byte.
    pub fn top(&self) -> u64 {
        self.top
    }

    /// Absolute offset one past the chunk's last byte.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// `top - begin`, as stored in the chunk header.
    pub fn top_offset(&self) -> u64 {
        self.top - self.begin
    }

    /// `end - begin`, as stored in the chunk header.
    pub fn end_offset(&self) -> u64 {
        self.end - self.begin
    }

    /// Whether the chunk holds writable objects.
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Shape and payload.
    pub fn kind(&self) -> &ChunkKind {
        &self.kind
    }

    /// Whether this is an aligned chunk.
    pub fn is_aligned(&self) -> bool {
        matches!(self.kind, ChunkKind::Aligned { .. })
    }

    /// Objects in this chunk, by ascending offset.
    pub fn objects(&self) -> &[ObjectId] {
        match &self.kind {
            ChunkKind::Aligned { objects } => objects,
            ChunkKind::Unaligned { object } => std::slice::from_ref(object),
        }
    }

    /// Bytes still free between top and end.
    pub fn remaining(&self) -> u64 {
        self.end - self.top
    }

    /// Total chunk size in bytes.
    pub fn size(&self) -> u64 {
        self.end - self.begin
    }
}
