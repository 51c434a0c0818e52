//! Core types and traits for ahead-of-time image heap layout.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by the layout engine and its collaborators:
//! object and chunk identifiers, the resolved description of a
//! precomputed object, the seven heap partitions, and the
//! [`ImageHeap`] trait through which the object-graph discovery stage
//! hands its finished object set to the layouter.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod id;
pub mod object;
pub mod partition;
pub mod traits;

pub use id::{ChunkId, ObjectId};
pub use object::ImageObject;
pub use partition::{PartitionKind, Writability};
pub use traits::ImageHeap;
