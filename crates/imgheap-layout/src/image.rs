//! Whole-image construction.

use imgheap_core::{ChunkId, ImageHeap};

use crate::error::LayoutError;
use crate::header::{ByteOrder, ChunkHeader};
use crate::layouter::{ImageHeapLayout, ImageHeapLayouter};
use crate::writer::HostedChunkWriter;

/// A laid-out image heap with its chunk headers stamped.
///
/// Object contents are not written here; the buffer holds zeros
/// everywhere except chunk headers.
#[derive(Clone, Debug)]
pub struct HeapImage {
    layout: ImageHeapLayout,
    bytes: Vec<u8>,
    order: ByteOrder,
}

impl HeapImage {
    /// Assign every object of `heap`, lay out, and stamp headers in
    /// `order` into a fresh zeroed buffer.
    pub fn build(
        mut layouter: ImageHeapLayouter,
        heap: &dyn ImageHeap,
        order: ByteOrder,
    ) -> Result<Self, LayoutError> {
        layouter.assign_all(heap)?;
        let layout = layouter.layout(heap.type_descriptor_count())?;
        let info = *layout.layout_info();
        let size = usize::try_from(info.image_size).map_err(|_| LayoutError::LayoutOverflow {
            requested_end: info.image_end(),
            limit: usize::MAX as u64,
        })?;

        let mut bytes = vec![0u8; size];
        let mut writer = HostedChunkWriter::new(&mut bytes, 0, info.start_offset, order);
        layout.write_headers(&mut writer)?;
        Ok(Self {
            layout,
            bytes,
            order,
        })
    }

    /// The layout behind the image.
    pub fn layout(&self) -> &ImageHeapLayout {
        &self.layout
    }

    /// Image bytes; index 0 is the layout's start offset.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte order the headers were written in.
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Decode the stamped header of chunk `id`.
    pub fn header(&self, id: ChunkId) -> Option<ChunkHeader> {
        let chunk = self.layout.chunks().chunk(id)?;
        let at = chunk.begin() - self.layout.layout_info().start_offset;
        ChunkHeader::read(&self.bytes, usize::try_from(at).ok()?, self.order)
    }

    /// Split into layout and bytes.
    pub fn into_parts(self) -> (ImageHeapLayout, Vec<u8>) {
        (self.layout, self.bytes)
    }
}
