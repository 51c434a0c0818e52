//! Chunk-header binary layout.
//!
//! The collector walks the image's chunks at startup straight from these
//! headers, so field order, width and sign are fixed:
//!
//! ```text
//! offset  field
//! 0       top offset            u64, relative to chunk begin
//! 8       end offset            u64, relative to chunk begin
//! 16      offset to previous    i64, 0 if none
//! 24      offset to next        i64, 0 if none
//! 32      flags                 u64, bit 0 = remembered set enabled
//! 40      card table            1 byte per card
//! ```
//!
//! An aligned chunk has one card per `card_size` bytes of chunk. An
//! unaligned chunk has exactly one card.

use crate::config::{ConfigError, LayoutConfig};

/// Width of every header word.
pub const WORD_BYTES: u64 = 8;

/// Offset of the top-offset word.
pub const TOP_OFFSET_AT: u64 = 0;
/// Offset of the end-offset word.
pub const END_OFFSET_AT: u64 = 8;
/// Offset of the signed offset to the previous chunk.
pub const OFFSET_TO_PREVIOUS_AT: u64 = 16;
/// Offset of the signed offset to the next chunk.
pub const OFFSET_TO_NEXT_AT: u64 = 24;
/// Offset of the flags word.
pub const FLAGS_AT: u64 = 32;
/// Offset of the first card.
pub const CARD_TABLE_AT: u64 = 40;

/// Flags bit: the chunk's remembered set is enabled.
pub const FLAG_REMEMBERED_SET: u64 = 1;

/// Card value meaning "no old-to-young references recorded".
pub const CLEAN_CARD: u8 = 1;

/// Header length of an unaligned chunk: words plus one card.
pub const UNALIGNED_HEADER_BYTES: u64 = CARD_TABLE_AT + 1;

/// Header length of an aligned chunk of `chunk_size` bytes.
pub fn aligned_header_bytes(chunk_size: u64, card_size: u64) -> u64 {
    CARD_TABLE_AT + chunk_size / card_size
}

/// Byte order of header words in the target buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

impl ByteOrder {
    /// Byte order of the machine running this code.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    /// Encode one word.
    pub fn encode(self, value: u64) -> [u8; 8] {
        match self {
            Self::Little => value.to_le_bytes(),
            Self::Big => value.to_be_bytes(),
        }
    }

    /// Decode one word.
    pub fn decode(self, bytes: [u8; 8]) -> u64 {
        match self {
            Self::Little => u64::from_le_bytes(bytes),
            Self::Big => u64::from_be_bytes(bytes),
        }
    }
}

/// Card counts for the two chunk kinds of one configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeaderShape {
    aligned_cards: u64,
}

impl HeaderShape {
    /// Check that `config` reserves room for both header kinds.
    pub fn for_config(config: &LayoutConfig) -> Result<Self, ConfigError> {
        let aligned = aligned_header_bytes(config.chunk_size(), config.card_size);
        if config.aligned_header_size < aligned {
            return Err(ConfigError::HeaderReserveTooSmall {
                required: aligned,
                reserve: config.aligned_header_size,
            });
        }
        if config.unaligned_header_size < UNALIGNED_HEADER_BYTES {
            return Err(ConfigError::HeaderReserveTooSmall {
                required: UNALIGNED_HEADER_BYTES,
                reserve: config.unaligned_header_size,
            });
        }
        Ok(Self {
            aligned_cards: config.cards_per_chunk(),
        })
    }

    /// Cards in an aligned (`true`) or unaligned (`false`) chunk.
    pub fn card_count(&self, aligned: bool) -> u64 {
        if aligned {
            self.aligned_cards
        } else {
            1
        }
    }
}

/// A decoded chunk header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Top relative to chunk begin.
    pub top_offset: u64,
    /// End relative to chunk begin.
    pub end_offset: u64,
    /// Previous chunk's begin minus this chunk's begin.
    pub offset_to_previous: i64,
    /// Next chunk's begin minus this chunk's begin.
    pub offset_to_next: i64,
    /// Whether the remembered set is enabled.
    pub remembered_set: bool,
}

impl ChunkHeader {
    /// Decode the header stored at `bytes[at..]`.
    ///
    /// Returns `None` if the words run past the end of `bytes`.
    pub fn read(bytes: &[u8], at: usize, order: ByteOrder) -> Option<Self> {
        let word = |field: u64| -> Option<u64> {
            let start = at.checked_add(usize::try_from(field).ok()?)?;
            let end = start.checked_add(WORD_BYTES as usize)?;
            let raw: [u8; 8] = bytes.get(start..end)?.try_into().ok()?;
            Some(order.decode(raw))
        };
        Some(Self {
            top_offset: word(TOP_OFFSET_AT)?,
            end_offset: word(END_OFFSET_AT)?,
            offset_to_previous: word(OFFSET_TO_PREVIOUS_AT)? as i64,
            offset_to_next: word(OFFSET_TO_NEXT_AT)? as i64,
            remembered_set: word(FLAGS_AT)? & FLAG_REMEMBERED_SET != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::HeapPolicy;

    #[test]
    fn header_sizes() {
        assert_eq!(aligned_header_bytes(1 << 20, 512), 40 + 2048);
        assert_eq!(UNALIGNED_HEADER_BYTES, 41);
    }

    #[test]
    fn byte_order_encodes_both_ways() {
        assert_eq!(ByteOrder::Little.encode(1), [1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(ByteOrder::Big.encode(1), [0, 0, 0, 0, 0, 0, 0, 1]);
        let v = 0x0102_0304_0506_0708;
        assert_eq!(ByteOrder::Big.decode(ByteOrder::Big.encode(v)), v);
        assert_eq!(ByteOrder::native().encode(v), v.to_ne_bytes());
    }

    #[test]
    fn unreserved_config_has_no_header_shape() {
        let config = LayoutConfig::unreserved(HeapPolicy::new(64, 64).unwrap());
        assert_eq!(
            HeaderShape::for_config(&config),
            Err(ConfigError::HeaderReserveTooSmall {
                required: 41,
                reserve: 0,
            })
        );
        let shape = HeaderShape::for_config(&LayoutConfig::default()).unwrap();
        assert_eq!(shape.card_count(true), 2048);
        assert_eq!(shape.card_count(false), 1);
    }

    #[test]
    fn read_decodes_negative_offsets() {
        let mut bytes = vec![0u8; 48];
        bytes[16..24].copy_from_slice(&ByteOrder::Little.encode((-64i64) as u64));
        bytes[32] = 1;
        let header = ChunkHeader::read(&bytes, 0, ByteOrder::Little).unwrap();
        assert_eq!(header.offset_to_previous, -64);
        assert!(header.remembered_set);
        assert!(ChunkHeader::read(&bytes, 16, ByteOrder::Little).is_none());
        // The flags word ends exactly at the card table.
        assert!(ChunkHeader::read(&bytes[..40], 0, ByteOrder::Little).is_some());
        assert!(ChunkHeader::read(&bytes[..39], 0, ByteOrder::Little).is_none());
    }
}
