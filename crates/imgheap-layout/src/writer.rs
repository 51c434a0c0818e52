//! Chunk-header writers.
//!
//! [`write_chunk_headers`] walks the aligned and the unaligned chunk list
//! separately with a `(previous, current, next)` window and stamps each
//! chunk's header through a [`ChunkWriter`]. The two writers differ only
//! in how a word reaches memory: [`HostedChunkWriter`] encodes in a
//! caller-chosen byte order for an image built on another machine,
//! [`RuntimeChunkWriter`] stores native words into memory the program
//! will run from.

use std::ops::Range;

use imgheap_core::ChunkId;
use log::debug;

use crate::allocator::ChunkTable;
use crate::chunk::{Chunk, ChunkKind};
use crate::error::LayoutError;
use crate::header::{
    ByteOrder, HeaderShape, CARD_TABLE_AT, CLEAN_CARD, END_OFFSET_AT, FLAGS_AT,
    FLAG_REMEMBERED_SET, OFFSET_TO_NEXT_AT, OFFSET_TO_PREVIOUS_AT, TOP_OFFSET_AT, WORD_BYTES,
};

/// Store primitives for header stamping.
///
/// Positions are absolute layout offsets; each implementation maps them
/// onto its own target memory.
pub trait ChunkWriter {
    /// Store one 8-byte word at `position`.
    fn write_word(&mut self, position: u64, value: u64) -> Result<(), LayoutError>;

    /// Set `len` bytes starting at `position` to `value`.
    fn fill(&mut self, position: u64, len: u64, value: u8) -> Result<(), LayoutError>;
}

/// Map `[position, position + len)` onto a buffer of `available` bytes
/// whose index 0 corresponds to layout offset `-addend`.
fn buffer_range(
    available: usize,
    addend: i64,
    position: u64,
    len: u64,
) -> Result<Range<usize>, LayoutError> {
    let start = i128::from(position) + i128::from(addend);
    let end = start + i128::from(len);
    if start < 0 || end > available as i128 {
        return Err(LayoutError::ImageBufferTooSmall {
            position: i64::try_from(start).unwrap_or(i64::MIN),
            len,
            available,
        });
    }
    Ok(start as usize..end as usize)
}

fn buffer_addend(image_heap_offset_in_buffer: u64, start_offset: u64) -> i64 {
    (image_heap_offset_in_buffer as i64).wrapping_sub(start_offset as i64)
}

/// Writes headers into an image buffer in a chosen byte order.
#[derive(Debug)]
pub struct HostedChunkWriter<'a> {
    buffer: &'a mut [u8],
    addend: i64,
    order: ByteOrder,
}

impl<'a> HostedChunkWriter<'a> {
    /// Layout offset `start_offset` maps to buffer index
    /// `image_heap_offset_in_buffer`.
    pub fn new(
        buffer: &'a mut [u8],
        image_heap_offset_in_buffer: u64,
        start_offset: u64,
        order: ByteOrder,
    ) -> Self {
        Self {
            buffer,
            addend: buffer_addend(image_heap_offset_in_buffer, start_offset),
            order,
        }
    }
}

impl ChunkWriter for HostedChunkWriter<'_> {
    fn write_word(&mut self, position: u64, value: u64) -> Result<(), LayoutError> {
        let range = buffer_range(self.buffer.len(), self.addend, position, WORD_BYTES)?;
        self.buffer[range].copy_from_slice(&self.order.encode(value));
        Ok(())
    }

    fn fill(&mut self, position: u64, len: u64, value: u8) -> Result<(), LayoutError> {
        let range = buffer_range(self.buffer.len(), self.addend, position, len)?;
        self.buffer[range].fill(value);
        Ok(())
    }
}

/// Writes headers in native byte order into memory the image runs from.
///
/// The memory is a live image heap at runtime, so words are stored with
/// plain native-endian stores and no encoding step.
#[derive(Debug)]
pub struct RuntimeChunkWriter<'a> {
    memory: &'a mut [u8],
    addend: i64,
}

impl<'a> RuntimeChunkWriter<'a> {
    /// Layout offset `start_offset` maps to `memory[image_heap_offset]`.
    pub fn new(memory: &'a mut [u8], image_heap_offset: u64, start_offset: u64) -> Self {
        Self {
            memory,
            addend: buffer_addend(image_heap_offset, start_offset),
        }
    }
}

impl ChunkWriter for RuntimeChunkWriter<'_> {
    fn write_word(&mut self, position: u64, value: u64) -> Result<(), LayoutError> {
        let range = buffer_range(self.memory.len(), self.addend, position, WORD_BYTES)?;
        self.memory[range].copy_from_slice(&value.to_ne_bytes());
        Ok(())
    }

    fn fill(&mut self, position: u64, len: u64, value: u8) -> Result<(), LayoutError> {
        let range = buffer_range(self.memory.len(), self.addend, position, len)?;
        self.memory[range].fill(value);
        Ok(())
    }
}

/// Stamp the header of every chunk in `chunks`.
pub fn write_chunk_headers<W: ChunkWriter + ?Sized>(
    writer: &mut W,
    shape: &HeaderShape,
    chunks: &ChunkTable,
) -> Result<(), LayoutError> {
    write_chunk_list(writer, shape, chunks, chunks.aligned_ids(), true)?;
    write_chunk_list(writer, shape, chunks, chunks.unaligned_ids(), false)
}

fn write_chunk_list<W: ChunkWriter + ?Sized>(
    writer: &mut W,
    shape: &HeaderShape,
    chunks: &ChunkTable,
    ids: &[ChunkId],
    aligned: bool,
) -> Result<(), LayoutError> {
    let expected = if aligned { "aligned" } else { "unaligned" };
    let mut previous: Option<&Chunk> = None;
    let mut current: Option<&Chunk> = None;
    for &id in ids {
        let next = chunks
            .chunk(id)
            .ok_or(LayoutError::UnknownChunkKind { chunk: id, expected })?;
        if let Some(chunk) = current {
            write_header(writer, shape, previous, chunk, Some(next), aligned)?;
        }
        previous = current;
        current = Some(next);
    }
    if let Some(chunk) = current {
        write_header(writer, shape, previous, chunk, None, aligned)?;
    }
    debug!("stamped {} {expected} chunk headers", ids.len());
    Ok(())
}

fn write_header<W: ChunkWriter + ?Sized>(
    writer: &mut W,
    shape: &HeaderShape,
    previous: Option<&Chunk>,
    current: &Chunk,
    next: Option<&Chunk>,
    aligned: bool,
) -> Result<(), LayoutError> {
    match (current.kind(), aligned) {
        (ChunkKind::Aligned { .. }, true) | (ChunkKind::Unaligned { .. }, false) => {}
        _ => {
            return Err(LayoutError::UnknownChunkKind {
                chunk: current.id(),
                expected: if aligned { "aligned" } else { "unaligned" },
            });
        }
    }

    let begin = current.begin();
    let delta = |other: Option<&Chunk>| other.map_or(0, |c| c.begin().wrapping_sub(begin));
    writer.write_word(begin + TOP_OFFSET_AT, current.top_offset())?;
    writer.write_word(begin + END_OFFSET_AT, current.end_offset())?;
    writer.write_word(begin + OFFSET_TO_PREVIOUS_AT, delta(previous))?;
    writer.write_word(begin + OFFSET_TO_NEXT_AT, delta(next))?;
    if current.is_writable() {
        writer.write_word(begin + FLAGS_AT, FLAG_REMEMBERED_SET)?;
        writer.fill(begin + CARD_TABLE_AT, shape.card_count(aligned), CLEAN_CARD)?;
    } else {
        writer.write_word(begin + FLAGS_AT, 0)?;
    }
    Ok(())
}
