//! Layout configuration and configuration errors.

use std::error::Error;
use std::fmt;

use crate::chunk::align_up;
use crate::header;
use crate::policy::HeapPolicy;

/// Configuration for one image heap layout run.
///
/// Validated by [`LayoutConfig::validate`] before any layout work starts;
/// all values are treated as immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutConfig {
    /// Chunk size and huge-object threshold.
    pub policy: HeapPolicy,

    /// Offset of the image heap's first byte within the layout address
    /// space. Default: 0.
    pub start_offset: u64,

    /// Whether object offsets must be strictly positive so that a
    /// compressed reference of zero always means null. Requires a
    /// non-empty header reserve in both chunk kinds.
    pub compressed_null_padding: bool,

    /// Minimum start alignment for objects and unaligned chunk sizes.
    /// Must be a power of two. Default: 8.
    pub object_alignment: u64,

    /// Bytes of chunk covered by one remembered-set card. Must be a power
    /// of two no larger than the chunk size. Default: 512.
    pub card_size: u64,

    /// Offset of the first object within an aligned chunk. Default: the
    /// aligned header (words plus card table) rounded to `object_alignment`.
    pub aligned_header_size: u64,

    /// Offset of the object within an unaligned chunk. Default: the
    /// unaligned header rounded to `object_alignment`.
    pub unaligned_header_size: u64,

    /// Upper bound on the laid-out image size in bytes. Default: 32 GiB,
    /// the reach of 32-bit compressed references with 8-byte alignment.
    pub max_image_size: u64,
}

impl LayoutConfig {
    /// Default minimum object alignment.
    pub const DEFAULT_OBJECT_ALIGNMENT: u64 = 8;

    /// Default card size.
    pub const DEFAULT_CARD_SIZE: u64 = 512;

    /// Default image size bound.
    pub const DEFAULT_MAX_IMAGE_SIZE: u64 = 32 << 30;

    /// Create a config for the given policy with headers reserved per
    /// the chunk-header ABI and defaults for everything else.
    pub fn new(policy: HeapPolicy) -> Self {
        let chunk_size = policy.aligned_chunk_size();
        let card_size = Self::DEFAULT_CARD_SIZE.min(chunk_size);
        let alignment = Self::DEFAULT_OBJECT_ALIGNMENT;
        let aligned = header::aligned_header_bytes(chunk_size, card_size);
        Self {
            policy,
            start_offset: 0,
            compressed_null_padding: false,
            object_alignment: alignment,
            card_size,
            aligned_header_size: align_up(aligned, alignment).unwrap_or(aligned),
            unaligned_header_size: align_up(header::UNALIGNED_HEADER_BYTES, alignment)
                .unwrap_or(header::UNALIGNED_HEADER_BYTES),
            max_image_size: Self::DEFAULT_MAX_IMAGE_SIZE,
        }
    }

    /// Create a config that reserves no header space in either chunk kind.
    ///
    /// Objects start at the first byte of their chunk. Useful for pure
    /// packing; headers cannot be written for a layout built this way.
    pub fn unreserved(policy: HeapPolicy) -> Self {
        Self {
            aligned_header_size: 0,
            unaligned_header_size: 0,
            ..Self::new(policy)
        }
    }

    /// Aligned chunk size.
    pub fn chunk_size(&self) -> u64 {
        self.policy.aligned_chunk_size()
    }

    /// Huge-object threshold from the policy.
    pub fn huge_object_threshold(&self) -> u64 {
        self.policy.huge_object_threshold()
    }

    /// Bytes available for objects in one aligned chunk.
    pub fn aligned_chunk_capacity(&self) -> u64 {
        self.chunk_size().saturating_sub(self.aligned_header_size)
    }

    /// Number of cards in an aligned chunk's remembered set.
    pub fn cards_per_chunk(&self) -> u64 {
        self.chunk_size() / self.card_size
    }

    /// Exclusive upper bound for any byte of the image.
    pub fn image_limit(&self) -> u64 {
        self.start_offset.saturating_add(self.max_image_size)
    }

    /// Check every structural invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let chunk_size = self.chunk_size();
        // Re-run the policy checks: the policy field is public.
        HeapPolicy::new(chunk_size, self.policy.huge_object_threshold())?;

        if !self.object_alignment.is_power_of_two() || self.object_alignment > chunk_size {
            return Err(ConfigError::ObjectAlignmentNotPowerOfTwo {
                alignment: self.object_alignment,
            });
        }
        if !self.card_size.is_power_of_two() || self.card_size > chunk_size {
            return Err(ConfigError::CardSizeInvalid {
                card_size: self.card_size,
                chunk_size,
            });
        }
        for header_size in [self.aligned_header_size, self.unaligned_header_size] {
            if header_size % self.object_alignment != 0 {
                return Err(ConfigError::HeaderMisaligned {
                    header_size,
                    alignment: self.object_alignment,
                });
            }
        }
        // A zero reserve is the header-less packing mode.
        let reserves = [
            (
                self.aligned_header_size,
                header::aligned_header_bytes(chunk_size, self.card_size),
            ),
            (self.unaligned_header_size, header::UNALIGNED_HEADER_BYTES),
        ];
        for (reserve, required) in reserves {
            if reserve != 0 && reserve < required {
                return Err(ConfigError::HeaderReserveTooSmall { required, reserve });
            }
        }
        if self.aligned_header_size >= chunk_size {
            return Err(ConfigError::HeaderDoesNotFit {
                header_size: self.aligned_header_size,
                chunk_size,
            });
        }
        let threshold = self.huge_object_threshold();
        if threshold > self.aligned_chunk_capacity() {
            return Err(ConfigError::ThresholdExceedsChunkCapacity {
                threshold,
                capacity: self.aligned_chunk_capacity(),
            });
        }
        if self.compressed_null_padding
            && (self.aligned_header_size == 0 || self.unaligned_header_size == 0)
        {
            return Err(ConfigError::NullPaddingUnsatisfied);
        }
        if self.max_image_size < chunk_size {
            return Err(ConfigError::ImageLimitTooSmall {
                max_image_size: self.max_image_size,
                chunk_size,
            });
        }
        Ok(())
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::new(HeapPolicy::default())
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while validating a [`HeapPolicy`] or [`LayoutConfig`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Aligned chunk size is not a power of two.
    ChunkSizeNotPowerOfTwo {
        /// The configured chunk size.
        chunk_size: u64,
    },
    /// Huge-object threshold is larger than an aligned chunk.
    ThresholdExceedsChunkSize {
        /// The effective threshold.
        threshold: u64,
        /// The configured chunk size.
        chunk_size: u64,
    },
    /// Huge-object threshold is larger than the space left in an aligned
    /// chunk after its header, so some non-huge object could never fit.
    ThresholdExceedsChunkCapacity {
        /// The effective threshold.
        threshold: u64,
        /// Bytes available for objects per aligned chunk.
        capacity: u64,
    },
    /// Object alignment is not a power of two, or exceeds the chunk size.
    ObjectAlignmentNotPowerOfTwo {
        /// The configured alignment.
        alignment: u64,
    },
    /// Card size is not a power of two, or exceeds the chunk size.
    CardSizeInvalid {
        /// The configured card size.
        card_size: u64,
        /// The configured chunk size.
        chunk_size: u64,
    },
    /// The aligned header reserve leaves no room for objects.
    HeaderDoesNotFit {
        /// The configured header reserve.
        header_size: u64,
        /// The configured chunk size.
        chunk_size: u64,
    },
    /// A header reserve is smaller than the chunk header written into it.
    HeaderReserveTooSmall {
        /// Bytes the header and its card table occupy.
        required: u64,
        /// The configured reserve.
        reserve: u64,
    },
    /// A header reserve is not a multiple of the object alignment.
    HeaderMisaligned {
        /// The configured header size.
        header_size: u64,
        /// The configured object alignment.
        alignment: u64,
    },
    /// Compressed-null padding was requested but objects could start at
    /// offset 0 of a chunk.
    NullPaddingUnsatisfied,
    /// The image size bound cannot hold even one aligned chunk.
    ImageLimitTooSmall {
        /// The configured bound.
        max_image_size: u64,
        /// The configured chunk size.
        chunk_size: u64,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChunkSizeNotPowerOfTwo { chunk_size } => {
                write!(f, "aligned chunk size ({chunk_size}) should be a power of 2")
            }
            Self::ThresholdExceedsChunkSize {
                threshold,
                chunk_size,
            } => write!(
                f,
                "huge object threshold ({threshold}) should be below or equal to \
                 aligned chunk size ({chunk_size})"
            ),
            Self::ThresholdExceedsChunkCapacity {
                threshold,
                capacity,
            } => write!(
                f,
                "huge object threshold ({threshold}) exceeds usable aligned chunk \
                 capacity ({capacity})"
            ),
            Self::ObjectAlignmentNotPowerOfTwo { alignment } => write!(
                f,
                "object alignment ({alignment}) should be a power of 2 no larger than a chunk"
            ),
            Self::CardSizeInvalid {
                card_size,
                chunk_size,
            } => write!(
                f,
                "card size ({card_size}) should be a power of 2 no larger than \
                 the chunk size ({chunk_size})"
            ),
            Self::HeaderDoesNotFit {
                header_size,
                chunk_size,
            } => write!(
                f,
                "chunk header reserve ({header_size}) leaves no room in a {chunk_size}-byte chunk"
            ),
            Self::HeaderReserveTooSmall { required, reserve } => write!(
                f,
                "chunk header needs {required} bytes but only {reserve} are reserved"
            ),
            Self::HeaderMisaligned {
                header_size,
                alignment,
            } => write!(
                f,
                "chunk header reserve ({header_size}) is not a multiple of the \
                 object alignment ({alignment})"
            ),
            Self::NullPaddingUnsatisfied => write!(
                f,
                "compressed null padding requires a non-empty header reserve in both chunk kinds"
            ),
            Self::ImageLimitTooSmall {
                max_image_size,
                chunk_size,
            } => write!(
                f,
                "image size bound ({max_image_size}) is smaller than one chunk ({chunk_size})"
            ),
        }
    }
}

impl Error for ConfigError {}
