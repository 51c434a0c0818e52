//! End-to-end layout scenarios through the public API.
//!
//! Covers the packing walk-throughs (shared chunk, overflow into a new
//! chunk, huge objects), the writable boundary with empty partitions,
//! and whole-image builds with header stamping.

use imgheap_core::{ChunkId, ImageHeap, ImageObject, ObjectId, PartitionKind};
use imgheap_layout::header::{CARD_TABLE_AT, CLEAN_CARD};
use imgheap_layout::{
    ByteOrder, ChunkHeader, HeapImage, ImageHeapLayouter, LayoutError, RuntimeChunkWriter,
};
use imgheap_test_utils::fixtures::{abi_config, mixed_heap, packing_config};
use imgheap_test_utils::MockImageHeap;

// ---------- Helpers ----------

fn layouter(chunk_size: u64, threshold: u64) -> ImageHeapLayouter {
    ImageHeapLayouter::new(packing_config(chunk_size, threshold)).unwrap()
}

// ---------- Packing ----------

#[test]
fn small_objects_fill_then_overflow_into_next_chunk() {
    let mut l = layouter(64, 64);
    for (id, size) in [(0, 16), (1, 16), (2, 40)] {
        let kind = l.assign(ImageObject::new(id, size).writable()).unwrap();
        assert_eq!(kind, PartitionKind::WritablePrimitive);
    }
    let layout = l.layout(0).unwrap();

    assert_eq!(layout.offset_of(ObjectId(0)), Some(0));
    assert_eq!(layout.offset_of(ObjectId(1)), Some(16));
    assert_eq!(layout.offset_of(ObjectId(2)), Some(64));
    let chunks = layout.chunks();
    assert_eq!(chunks.aligned_ids(), &[ChunkId(0), ChunkId(1)]);
    assert_eq!(chunks.chunk(ChunkId(0)).unwrap().top_offset(), 32);
    assert_eq!(chunks.chunk(ChunkId(1)).unwrap().begin(), 64);
    assert_eq!(layout.placement(ObjectId(2)).unwrap().chunk(), ChunkId(1));
}

#[test]
fn huge_object_is_alone_in_an_unaligned_chunk() {
    let mut l = layouter(64, 64);
    l.assign(ImageObject::new(0, 8)).unwrap();
    l.assign(ImageObject::new(1, 128)).unwrap();
    l.assign(ImageObject::new(2, 8)).unwrap();
    let layout = l.layout(0).unwrap();

    let huge = layout.placement(ObjectId(1)).unwrap();
    assert_eq!(huge.partition(), PartitionKind::ReadOnlyHuge);
    let chunk = layout.chunks().chunk(huge.chunk()).unwrap();
    assert!(!chunk.is_aligned());
    assert_eq!(chunk.size(), 128);
    assert_eq!(chunk.objects(), &[ObjectId(1)]);
    // The two small objects still share the first aligned chunk.
    assert_eq!(
        layout.placement(ObjectId(0)).unwrap().chunk(),
        layout.placement(ObjectId(2)).unwrap().chunk()
    );
}

#[test]
fn zero_size_aborts_the_layout() {
    let mut l = layouter(64, 64);
    l.assign(ImageObject::new(0, 8)).unwrap();
    l.assign(ImageObject::new(1, 0).writable()).unwrap();
    assert!(matches!(
        l.layout(0),
        Err(LayoutError::InvalidLayoutRequest {
            object: ObjectId(1),
            ..
        })
    ));
}

#[test]
fn image_bound_is_enforced() {
    let mut config = packing_config(64, 64);
    config.max_image_size = 128;
    let mut l = ImageHeapLayouter::new(config).unwrap();
    for id in 0..3 {
        l.assign(ImageObject::new(id, 48)).unwrap();
    }
    assert!(matches!(l.layout(0), Err(LayoutError::LayoutOverflow { limit: 128, .. })));
}

// ---------- Writable boundary ----------

#[test]
fn writable_begin_follows_the_first_writable_chunk() {
    let mut l = layouter(64, 64);
    l.assign(ImageObject::new(0, 24)).unwrap();
    // Writable-primitive stays empty; writable-reference gets one object.
    l.assign(ImageObject::new(1, 8).writable().with_references()).unwrap();
    let layout = l.layout(0).unwrap();

    let placement = layout.placement(ObjectId(1)).unwrap();
    assert_eq!(placement.partition(), PartitionKind::WritableReference);
    let chunk = layout.chunks().chunk(placement.chunk()).unwrap();
    assert_eq!(layout.heap_info().writable_begin(), chunk.begin());
    assert_eq!(chunk.begin(), 64);
    assert!(layout
        .heap_info()
        .boundary(PartitionKind::WritablePrimitive)
        .is_empty());
}

#[test]
fn writable_begin_covers_the_chunk_header() {
    let mut l = ImageHeapLayouter::new(abi_config()).unwrap();
    l.assign(ImageObject::new(0, 24)).unwrap();
    l.assign(ImageObject::new(1, 8).writable()).unwrap();
    let layout = l.layout(0).unwrap();

    let placement = layout.placement(ObjectId(1)).unwrap();
    let chunk = layout.chunks().chunk(placement.chunk()).unwrap();
    assert_eq!(placement.offset(), chunk.begin() + 104);
    assert_eq!(layout.heap_info().writable_begin(), chunk.begin());
}

#[test]
fn only_huge_writable_objects_still_start_on_a_chunk_boundary() {
    let mut l = layouter(64, 64);
    l.assign(ImageObject::new(0, 8)).unwrap();
    l.assign(ImageObject::new(1, 200).writable()).unwrap();
    let layout = l.layout(0).unwrap();

    let info = layout.heap_info();
    assert_eq!(info.first_writable_unaligned_chunk(), Some(64));
    assert_eq!(info.writable_begin(), 64);
    assert_eq!(layout.layout_info().writable_size, 200);
}

#[test]
fn empty_partitions_leave_boundaries_unchanged() {
    let build = |extra_read_only: bool| {
        let mut l = layouter(64, 64);
        if extra_read_only {
            // Fills the read-only chunk without opening a new one.
            l.assign(ImageObject::new(9, 8)).unwrap();
        }
        l.assign(ImageObject::new(0, 8)).unwrap();
        l.assign(ImageObject::new(1, 8).writable()).unwrap();
        l.layout(0).unwrap()
    };
    let a = build(false);
    let b = build(true);
    assert_eq!(a.heap_info().writable_begin(), b.heap_info().writable_begin());
    for kind in [
        PartitionKind::ReadOnlyReference,
        PartitionKind::ReadOnlyRelocatable,
        PartitionKind::ReadOnlyHuge,
        PartitionKind::WritableReference,
        PartitionKind::WritableHuge,
    ] {
        assert!(a.heap_info().boundary(kind).is_empty());
    }
    let bounds = b.heap_info().boundary(PartitionKind::ReadOnlyPrimitive);
    assert_eq!((bounds.first, bounds.last), (Some(ObjectId(9)), Some(ObjectId(0))));
}

#[test]
fn relocatable_partition_is_reported() {
    let mut l = layouter(64, 64);
    l.assign(ImageObject::new(0, 8)).unwrap();
    l.assign(ImageObject::new(1, 16).relocatable()).unwrap();
    l.assign(ImageObject::new(2, 8).relocatable()).unwrap();
    let layout = l.layout(0).unwrap();

    let info = layout.layout_info();
    assert_eq!(info.read_only_relocatable_begin, 8);
    assert_eq!(info.read_only_relocatable_size, 24);
}

// ---------- Whole image ----------

#[test]
fn built_image_headers_match_the_chunks() {
    let heap = mixed_heap(200, 512);
    let l = ImageHeapLayouter::new(abi_config()).unwrap();
    let image = HeapImage::build(l, &heap, ByteOrder::Little).unwrap();
    let layout = image.layout();

    assert_eq!(layout.heap_info().type_descriptor_count(), heap.type_descriptor_count());
    assert_eq!(layout.placements().count(), heap.objects().len());
    assert_eq!(image.bytes().len() as u64, layout.layout_info().image_size);

    for chunk in layout.chunks().all() {
        let header = image.header(chunk.id()).unwrap();
        assert_eq!(header.top_offset, chunk.top_offset());
        assert_eq!(header.end_offset, chunk.end_offset());
        assert_eq!(header.remembered_set, chunk.is_writable());
        let card = image.bytes()[(chunk.begin() + CARD_TABLE_AT) as usize];
        if chunk.is_writable() {
            assert_eq!(card, CLEAN_CARD);
        }
    }
}

#[test]
fn start_offset_shifts_buffer_positions() {
    let mut config = abi_config();
    config.start_offset = 8;
    let mut heap = MockImageHeap::new();
    heap.push(16, |o| o).push(16, ImageObject::writable);
    let image = HeapImage::build(ImageHeapLayouter::new(config).unwrap(), &heap, ByteOrder::Big).unwrap();

    let layout = image.layout();
    let first = layout.chunks().chunk(ChunkId(0)).unwrap();
    assert_eq!(first.begin(), 4096);
    let at = (first.begin() - 8) as usize;
    let header = ChunkHeader::read(image.bytes(), at, image.byte_order()).unwrap();
    assert_eq!(header.offset_to_next, 4096);
    assert_eq!(image.header(ChunkId(0)), Some(header));
    assert_eq!(layout.layout_info().image_size, 3 * 4096 - 8);
}

#[test]
fn runtime_writer_matches_native_hosted_writer() {
    let heap = mixed_heap(60, 512);
    let hosted = HeapImage::build(
        ImageHeapLayouter::new(abi_config()).unwrap(),
        &heap,
        ByteOrder::native(),
    )
    .unwrap();
    let (layout, expected) = hosted.into_parts();

    let mut memory = vec![0u8; expected.len()];
    let mut writer = RuntimeChunkWriter::new(&mut memory, 0, layout.layout_info().start_offset);
    layout.write_headers(&mut writer).unwrap();
    assert_eq!(memory, expected);
}

#[test]
fn short_buffer_is_rejected() {
    let heap = mixed_heap(20, 512);
    let mut l = ImageHeapLayouter::new(abi_config()).unwrap();
    l.assign_all(&heap).unwrap();
    let layout = l.layout(heap.type_descriptor_count()).unwrap();
    let mut memory = vec![0u8; 16];
    let mut writer = RuntimeChunkWriter::new(&mut memory, 0, 0);
    assert!(matches!(
        layout.write_headers(&mut writer),
        Err(LayoutError::ImageBufferTooSmall { available: 16, .. })
    ));
}
