//! Bump-pointer chunk allocator shared by all partitions.
//!
//! The [`ChunkAllocator`] owns one position that only ever moves forward.
//! Aligned chunks are opened lazily per writability class, at the next
//! multiple of the chunk size; an object that does not fit in its class's
//! current chunk closes it and opens a new one. Huge objects each get a
//! fresh unaligned chunk at the current position. Every chunk is appended
//! to its list the moment it is opened, so both lists are in ascending
//! address order at all times.

use imgheap_core::{ChunkId, ImageObject, PartitionKind, Writability};
use log::{debug, trace};

use crate::chunk::{align_up, Chunk};
use crate::config::{ConfigError, LayoutConfig};
use crate::error::{LayoutError, RequestFault};
use crate::placement::Placement;

/// All chunks of one layout run, in creation (= address) order.
///
/// Read-only once layout finishes; the chunk-header writer walks the
/// aligned and unaligned lists separately.
#[derive(Clone, Debug, Default)]
pub struct ChunkTable {
    chunks: Vec<Chunk>,
    aligned: Vec<ChunkId>,
    unaligned: Vec<ChunkId>,
}

impl ChunkTable {
    /// Look up a chunk by id.
    pub fn chunk(&self, id: ChunkId) -> Option<&Chunk> {
        self.chunks.get(id.index())
    }

    /// Every chunk, ascending by begin offset.
    pub fn all(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Ids of aligned chunks, ascending by begin offset.
    pub fn aligned_ids(&self) -> &[ChunkId] {
        &self.aligned
    }

    /// Ids of unaligned chunks, ascending by begin offset.
    pub fn unaligned_ids(&self) -> &[ChunkId] {
        &self.unaligned
    }

    /// Aligned chunks, ascending by begin offset.
    pub fn aligned(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.aligned.iter().map(|id| &self.chunks[id.index()])
    }

    /// Unaligned chunks, ascending by begin offset.
    pub fn unaligned(&self) -> impl Iterator<Item = &Chunk> + '_ {
        self.unaligned.iter().map(|id| &self.chunks[id.index()])
    }

    /// Total number of chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether no chunk was created.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn from_parts(chunks: Vec<Chunk>, aligned: Vec<ChunkId>, unaligned: Vec<ChunkId>) -> Self {
        Self {
            chunks,
            aligned,
            unaligned,
        }
    }

    fn push(&mut self, chunk: Chunk) {
        if chunk.is_aligned() {
            self.aligned.push(chunk.id());
        } else {
            self.unaligned.push(chunk.id());
        }
        self.chunks.push(chunk);
    }
}

/// Packs objects into chunks for one layout run.
pub struct ChunkAllocator {
    chunk_size: u64,
    aligned_header_size: u64,
    unaligned_header_size: u64,
    object_alignment: u64,
    huge_object_threshold: u64,
    limit: u64,
    /// Next unreserved byte of the image.
    position: u64,
    table: ChunkTable,
    /// Aligned chunk currently being filled, per writability class.
    current: [Option<ChunkId>; 2],
}

impl ChunkAllocator {
    /// Create an allocator positioned at `config.start_offset`.
    pub fn new(config: &LayoutConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            chunk_size: config.chunk_size(),
            aligned_header_size: config.aligned_header_size,
            unaligned_header_size: config.unaligned_header_size,
            object_alignment: config.object_alignment,
            huge_object_threshold: config.huge_object_threshold(),
            limit: config.image_limit(),
            position: config.start_offset,
            table: ChunkTable::default(),
            current: [None; 2],
        })
    }

    /// Place `object` on behalf of `partition`.
    ///
    /// The partition decides the writability class and whether the object
    /// takes an aligned or an unaligned chunk. The object's size must agree
    /// with that decision: huge partitions accept only objects at or above
    /// the threshold, all others only objects below it.
    pub fn place_object(
        &mut self,
        partition: PartitionKind,
        object: &ImageObject,
    ) -> Result<Placement, LayoutError> {
        let invalid = |fault| LayoutError::InvalidLayoutRequest {
            object: object.id,
            fault,
        };
        if object.size == 0 {
            return Err(invalid(RequestFault::ZeroSize));
        }
        if !object.alignment.is_power_of_two() || object.alignment > self.chunk_size {
            return Err(invalid(RequestFault::UnsupportedAlignment {
                alignment: object.alignment,
            }));
        }
        let huge = partition.holds_huge_objects();
        if huge != (object.size >= self.huge_object_threshold) {
            return Err(invalid(RequestFault::HugeClassMismatch {
                size: object.size,
                threshold: self.huge_object_threshold,
                huge,
            }));
        }

        let alignment = object.alignment.max(self.object_alignment);
        let writability = partition.writability();
        let (chunk, offset) = if huge {
            self.place_in_unaligned_chunk(object, alignment, writability)?
        } else {
            self.place_in_aligned_chunk(object, alignment, writability)?
        };
        trace!(
            "placed object {} ({} bytes) for {partition} in chunk {chunk} at {offset:#x}",
            object.id,
            object.size
        );
        Ok(Placement::new(object.id, partition, chunk, offset))
    }

    fn place_in_aligned_chunk(
        &mut self,
        object: &ImageObject,
        alignment: u64,
        writability: Writability,
    ) -> Result<(ChunkId, u64), LayoutError> {
        if let Some(id) = self.current[writability.index()] {
            if let Some(offset) = self.table.chunks[id.index()].allocate(object.id, object.size, alignment) {
                return Ok((id, offset));
            }
        }

        // Check before opening so a refused request leaves no empty chunk.
        let first_offset = align_up(self.aligned_header_size, alignment).unwrap_or(u64::MAX);
        if first_offset.saturating_add(object.size) > self.chunk_size {
            return Err(LayoutError::InvalidLayoutRequest {
                object: object.id,
                fault: RequestFault::ExceedsChunkCapacity {
                    size: object.size,
                    capacity: self.chunk_size - self.aligned_header_size,
                },
            });
        }

        let id = self.open_aligned_chunk(writability)?;
        let offset = self.table.chunks[id.index()]
            .allocate(object.id, object.size, alignment)
            .ok_or(LayoutError::InvalidLayoutRequest {
                object: object.id,
                fault: RequestFault::ExceedsChunkCapacity {
                    size: object.size,
                    capacity: self.chunk_size - self.aligned_header_size,
                },
            })?;
        Ok((id, offset))
    }

    fn place_in_unaligned_chunk(
        &mut self,
        object: &ImageObject,
        alignment: u64,
        writability: Writability,
    ) -> Result<(ChunkId, u64), LayoutError> {
        let overflow = |requested_end| LayoutError::LayoutOverflow {
            requested_end,
            limit: self.limit,
        };
        let header_end = self
            .position
            .checked_add(self.unaligned_header_size)
            .ok_or(overflow(u64::MAX))?;
        let offset = align_up(header_end, alignment).ok_or(overflow(u64::MAX))?;
        let begin = offset - self.unaligned_header_size;
        let body = align_up(object.size, self.object_alignment).ok_or(overflow(u64::MAX))?;
        let end = offset.checked_add(body).ok_or(overflow(u64::MAX))?;
        if end > self.limit {
            return Err(overflow(end));
        }

        let id = self.next_chunk_id()?;
        let writable = writability.is_writable();
        self.table
            .push(Chunk::unaligned(id, begin, end - begin, object.id, writable));
        self.position = end;
        debug!(
            "opened unaligned chunk {id} at {begin:#x}, {} bytes (writable={writable})",
            end - begin
        );
        Ok((id, offset))
    }

    fn open_aligned_chunk(&mut self, writability: Writability) -> Result<ChunkId, LayoutError> {
        let begin = align_up(self.position, self.chunk_size).ok_or(LayoutError::LayoutOverflow {
            requested_end: u64::MAX,
            limit: self.limit,
        })?;
        let end = begin
            .checked_add(self.chunk_size)
            .filter(|&end| end <= self.limit)
            .ok_or(LayoutError::LayoutOverflow {
                requested_end: begin.saturating_add(self.chunk_size),
                limit: self.limit,
            })?;

        let id = self.next_chunk_id()?;
        let writable = writability.is_writable();
        self.table.push(Chunk::aligned(
            id,
            begin,
            self.chunk_size,
            self.aligned_header_size,
            writable,
        ));
        self.current[writability.index()] = Some(id);
        self.position = end;
        debug!("opened aligned chunk {id} at {begin:#x} (writable={writable})");
        Ok(id)
    }

    fn next_chunk_id(&self) -> Result<ChunkId, LayoutError> {
        u32::try_from(self.table.len())
            .map(ChunkId)
            .map_err(|_| LayoutError::LayoutOverflow {
                requested_end: self.position,
                limit: self.limit,
            })
    }

    /// Stop filling the current aligned chunk of `writability`.
    ///
    /// The next non-huge object of that class opens a new chunk.
    pub fn finish_aligned_chunk(&mut self, writability: Writability) {
        self.current[writability.index()] = None;
    }

    /// Advance the position to the next multiple of the chunk size.
    pub fn align_to_chunk_boundary(&mut self) -> Result<(), LayoutError> {
        self.position = align_up(self.position, self.chunk_size).ok_or(LayoutError::LayoutOverflow {
            requested_end: u64::MAX,
            limit: self.limit,
        })?;
        Ok(())
    }

    /// Where the next object of the given class would go.
    ///
    /// For aligned placement this is the open chunk's top, or the begin
    /// of the chunk that would be opened. For huge objects it is the
    /// current position.
    pub fn next_position(&self, writability: Writability, huge: bool) -> u64 {
        if huge {
            return self.position;
        }
        match self.current[writability.index()] {
            Some(id) => self.table.chunks[id.index()].top(),
            None => align_up(self.position, self.chunk_size).unwrap_or(self.position),
        }
    }

    /// Next unreserved byte of the image.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Chunks created so far.
    pub fn chunks(&self) -> &ChunkTable {
        &self.table
    }

    /// Finish the run and hand over the chunk table.
    pub fn into_chunks(self) -> ChunkTable {
        self.table
    }
}
