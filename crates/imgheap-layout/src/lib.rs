//! Chunked image heap layout for a generational collector.
//!
//! Takes the precomputed objects of an ahead-of-time compiled program,
//! sorts them into seven partitions, packs the partitions into chunks
//! and stamps the chunk headers the collector reads at startup.
//!
//! # Architecture
//!
//! ```text
//! ImageHeapLayouter (orchestrator)
//! ├── Partition × 7, canonical order, read-only first
//! │   └── ImageObject[] (discovery order)
//! └── ChunkAllocator (one per run, bump position)
//!     ├── aligned chunks: fixed power-of-two size, many objects
//!     └── unaligned chunks: one huge object each
//!
//! ImageHeapLayout (immutable result)
//! ├── HeapInfo    → runtime bootstrap
//! ├── LayoutInfo  → image writer
//! └── write_headers(ChunkWriter) → Hosted / Runtime writer
//! ```
//!
//! # Size classes
//!
//! - **Regular:** below the huge-object threshold. Packed into the
//!   current aligned chunk of the object's writability class.
//! - **Huge:** at or above the threshold. Alone in an unaligned chunk
//!   sized to the object.
//!
//! Everything runs on one thread, once per image build. Every error is
//! fatal to the build.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod allocator;
pub mod chunk;
pub mod config;
pub mod error;
pub mod header;
pub mod image;
pub mod info;
pub mod layouter;
pub mod partition;
pub mod placement;
pub mod policy;
pub mod writer;

// Public re-exports for the primary API surface.
pub use allocator::{ChunkAllocator, ChunkTable};
pub use chunk::{Chunk, ChunkKind};
pub use config::{ConfigError, LayoutConfig};
pub use error::{LayoutError, RequestFault};
pub use header::{ByteOrder, ChunkHeader};
pub use image::HeapImage;
pub use info::{HeapInfo, LayoutInfo, PartitionBoundary};
pub use layouter::{ImageHeapLayout, ImageHeapLayouter};
pub use partition::Partition;
pub use placement::Placement;
pub use policy::HeapPolicy;
pub use writer::{ChunkWriter, HostedChunkWriter, RuntimeChunkWriter};
