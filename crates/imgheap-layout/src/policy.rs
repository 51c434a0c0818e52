//! Heap sizing policy: chunk size and the huge-object threshold.
//!
//! Only the two compile-time constants of the collector's sizing policy
//! matter to the image layout. Everything about runtime heap and young
//! generation sizes stays with the collector.

use crate::config::ConfigError;

/// Aligned chunk size and large-object cutoff, validated at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapPolicy {
    aligned_chunk_size: u64,
    large_object_threshold: u64,
}

impl HeapPolicy {
    /// Default aligned chunk size: 1 MiB.
    pub const DEFAULT_ALIGNED_CHUNK_SIZE: u64 = 1 << 20;

    /// Configured threshold value meaning "derive from the chunk size".
    pub const THRESHOLD_SENTINEL: u64 = 0;

    /// With the sentinel threshold, objects of at least
    /// `chunk_size / CHUNK_FRACTION_FOR_THRESHOLD` bytes are huge.
    pub const CHUNK_FRACTION_FOR_THRESHOLD: u64 = 8;

    /// Build a policy, rejecting chunk sizes that are not powers of two
    /// and thresholds larger than a chunk.
    ///
    /// Pass [`HeapPolicy::THRESHOLD_SENTINEL`] as `large_object_threshold`
    /// to use the derived default.
    pub fn new(aligned_chunk_size: u64, large_object_threshold: u64) -> Result<Self, ConfigError> {
        if !aligned_chunk_size.is_power_of_two() {
            return Err(ConfigError::ChunkSizeNotPowerOfTwo {
                chunk_size: aligned_chunk_size,
            });
        }
        let policy = Self {
            aligned_chunk_size,
            large_object_threshold,
        };
        let threshold = policy.huge_object_threshold();
        if threshold > aligned_chunk_size {
            return Err(ConfigError::ThresholdExceedsChunkSize {
                threshold,
                chunk_size: aligned_chunk_size,
            });
        }
        Ok(policy)
    }

    /// Size and alignment of every aligned chunk.
    pub fn aligned_chunk_size(&self) -> u64 {
        self.aligned_chunk_size
    }

    /// Objects of at least this many bytes get their own unaligned chunk.
    pub fn huge_object_threshold(&self) -> u64 {
        if self.large_object_threshold == Self::THRESHOLD_SENTINEL {
            self.aligned_chunk_size / Self::CHUNK_FRACTION_FOR_THRESHOLD
        } else {
            self.large_object_threshold
        }
    }
}

impl Default for HeapPolicy {
    fn default() -> Self {
        Self {
            aligned_chunk_size: Self::DEFAULT_ALIGNED_CHUNK_SIZE,
            large_object_threshold: Self::THRESHOLD_SENTINEL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_threshold_is_an_eighth_of_a_chunk() {
        let policy = HeapPolicy::default();
        assert_eq!(policy.aligned_chunk_size(), 1 << 20);
        assert_eq!(policy.huge_object_threshold(), 128 * 1024);
    }

    #[test]
    fn explicit_threshold_is_kept() {
        let policy = HeapPolicy::new(64, 64).unwrap();
        assert_eq!(policy.huge_object_threshold(), 64);
    }

    #[test]
    fn rejects_non_power_of_two_chunk() {
        assert_eq!(
            HeapPolicy::new(3000, 0),
            Err(ConfigError::ChunkSizeNotPowerOfTwo { chunk_size: 3000 })
        );
        assert!(HeapPolicy::new(0, 0).is_err());
    }

    #[test]
    fn rejects_threshold_above_chunk_size() {
        assert_eq!(
            HeapPolicy::new(4096, 4097),
            Err(ConfigError::ThresholdExceedsChunkSize {
                threshold: 4097,
                chunk_size: 4096,
            })
        );
    }
}
