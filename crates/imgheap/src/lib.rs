//! imgheap: ahead-of-time layout of precomputed object graphs into
//! chunked heap images for a generational collector.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the imgheap sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use imgheap::prelude::*;
//!
//! // The finished object set from graph discovery.
//! struct Discovered(Vec<ImageObject>);
//! impl ImageHeap for Discovered {
//!     fn objects(&self) -> &[ImageObject] { &self.0 }
//!     fn type_descriptor_count(&self) -> usize { 1 }
//! }
//!
//! let heap = Discovered(vec![
//!     ImageObject::new(0, 64).with_references(),
//!     ImageObject::new(1, 24).writable(),
//!     ImageObject::new(2, 256 << 10),
//! ]);
//!
//! let layouter = ImageHeapLayouter::new(LayoutConfig::default()).unwrap();
//! let image = HeapImage::build(layouter, &heap, ByteOrder::Little).unwrap();
//! let layout = image.layout();
//!
//! // Read-only objects come first; the writable region starts on a chunk.
//! let writable = layout.placement(ObjectId(1)).unwrap();
//! assert_eq!(writable.partition(), PartitionKind::WritablePrimitive);
//! assert_eq!(layout.heap_info().writable_begin(), 2 << 20);
//! assert_eq!(layout.chunks().unaligned_ids().len(), 1);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `imgheap-core` | Ids, `ImageObject`, partitions, the `ImageHeap` trait |
//! | [`layout`] | `imgheap-layout` | Policy, config, allocator, layouter, headers, writers |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, ids and the collaborator trait (`imgheap-core`).
pub use imgheap_core as types;

/// The layout engine (`imgheap-layout`).
///
/// [`layout::ImageHeapLayouter`] runs a layout, [`layout::HeapImage`]
/// builds a whole image, and the [`layout::ChunkWriter`] implementations
/// stamp chunk headers into an existing buffer.
pub use imgheap_layout as layout;

/// Common imports for typical imgheap usage.
///
/// ```rust
/// use imgheap::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use imgheap_core::{ChunkId, ImageHeap, ImageObject, ObjectId, PartitionKind, Writability};

    // Configuration
    pub use imgheap_layout::{HeapPolicy, LayoutConfig};

    // Errors
    pub use imgheap_layout::{ConfigError, LayoutError, RequestFault};

    // Layout
    pub use imgheap_layout::{
        HeapImage, HeapInfo, ImageHeapLayout, ImageHeapLayouter, LayoutInfo, Placement,
    };

    // Headers
    pub use imgheap_layout::{
        ByteOrder, ChunkHeader, ChunkWriter, HostedChunkWriter, RuntimeChunkWriter,
    };
}
