//! Layout error types.
//!
//! Every error here is fatal to the image build. Layout is deterministic,
//! so nothing is retried: the build pipeline reports the error and stops.

use std::error::Error;
use std::fmt;

use imgheap_core::{ChunkId, ObjectId, PartitionKind};

use crate::config::ConfigError;

/// Why a single placement request was refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestFault {
    /// The object has no bytes.
    ZeroSize,
    /// The alignment is not a power of two or exceeds the chunk size.
    UnsupportedAlignment {
        /// The requested alignment.
        alignment: u64,
    },
    /// The huge flag disagrees with the object's size class.
    HugeClassMismatch {
        /// Object size.
        size: u64,
        /// Configured threshold.
        threshold: u64,
        /// The huge flag that came with the request.
        huge: bool,
    },
    /// The object cannot fit in an empty aligned chunk.
    ExceedsChunkCapacity {
        /// Object size plus alignment padding.
        size: u64,
        /// Bytes available for objects per aligned chunk.
        capacity: u64,
    },
    /// The object id was assigned to a partition already.
    DuplicateObject,
}

impl fmt::Display for RequestFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSize => write!(f, "object size is zero"),
            Self::UnsupportedAlignment { alignment } => {
                write!(f, "alignment {alignment} cannot be satisfied")
            }
            Self::HugeClassMismatch {
                size,
                threshold,
                huge,
            } => write!(
                f,
                "size {size} with huge={huge} contradicts threshold {threshold}"
            ),
            Self::ExceedsChunkCapacity { size, capacity } => {
                write!(f, "size {size} exceeds aligned chunk capacity {capacity}")
            }
            Self::DuplicateObject => write!(f, "object assigned twice"),
        }
    }
}

/// Errors that abort a layout run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutError {
    /// An object could not be placed as requested.
    InvalidLayoutRequest {
        /// The offending object.
        object: ObjectId,
        /// What was wrong with the request.
        fault: RequestFault,
    },
    /// The image would grow past its configured or addressable bound.
    LayoutOverflow {
        /// End offset the failing step needed.
        requested_end: u64,
        /// Exclusive bound from the configuration.
        limit: u64,
    },
    /// A chunk list held a chunk of the wrong kind. Always a bug.
    UnknownChunkKind {
        /// The offending chunk.
        chunk: ChunkId,
        /// The kind the list is supposed to hold.
        expected: &'static str,
    },
    /// A partition was laid out more than once.
    PartitionReused {
        /// The partition.
        partition: PartitionKind,
    },
    /// A header write fell outside the target buffer.
    ImageBufferTooSmall {
        /// Buffer index the write started at (may be negative).
        position: i64,
        /// Number of bytes written.
        len: u64,
        /// Buffer length.
        available: usize,
    },
    /// The configuration was rejected before layout started.
    Configuration(ConfigError),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLayoutRequest { object, fault } => {
                write!(f, "invalid layout request for object {object}: {fault}")
            }
            Self::LayoutOverflow {
                requested_end,
                limit,
            } => write!(
                f,
                "image heap layout overflow: needs offset {requested_end:#x}, limit {limit:#x}"
            ),
            Self::UnknownChunkKind { chunk, expected } => {
                write!(f, "chunk {chunk} is not an {expected} chunk")
            }
            Self::PartitionReused { partition } => {
                write!(f, "partition {partition} was already laid out")
            }
            Self::ImageBufferTooSmall {
                position,
                len,
                available,
            } => write!(
                f,
                "write of {len} bytes at buffer index {position} exceeds buffer of {available} bytes"
            ),
            Self::Configuration(e) => write!(f, "configuration: {e}"),
        }
    }
}

impl Error for LayoutError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Configuration(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for LayoutError {
    fn from(e: ConfigError) -> Self {
        Self::Configuration(e)
    }
}
