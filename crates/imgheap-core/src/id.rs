//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a precomputed object in the image heap.
///
/// Assigned by the object-graph discovery stage. The layouter never
/// invents ids; it only records where each one was placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ObjectId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a chunk created during one layout run.
///
/// Chunk ids are handed out in creation order. Because the allocator
/// only ever moves its position forward, creation order is also
/// ascending begin-offset order across both chunk kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub u32);

impl ChunkId {
    /// Position of this chunk in the allocator's chunk table.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ChunkId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_as_plain_numbers() {
        assert_eq!(ObjectId(17).to_string(), "17");
        assert_eq!(ChunkId(3).to_string(), "3");
    }

    #[test]
    fn chunk_ids_order_by_creation() {
        assert!(ChunkId(0) < ChunkId(1));
        assert_eq!(ChunkId(5).index(), 5);
    }
}
