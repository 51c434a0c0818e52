//! Resolved description of one precomputed object.

use crate::id::ObjectId;

/// A precomputed object ready for placement.
///
/// Everything the layouter needs is already resolved by the build
/// pipeline: the byte size from the object's field layout, the
/// alignment its storage kind requires, and the three attributes that
/// decide its partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageObject {
    /// Identity assigned by graph discovery.
    pub id: ObjectId,
    /// Size in bytes, including the object header.
    pub size: u64,
    /// Required start alignment in bytes. Must be a power of two.
    pub alignment: u64,
    /// Whether the object may be mutated after the image is mapped.
    pub writable: bool,
    /// Whether the object has reference-typed fields.
    pub contains_references: bool,
    /// Whether the object holds pointers that the loader must relocate.
    pub relocatable: bool,
}

impl ImageObject {
    /// Default alignment for objects that do not ask for more.
    pub const DEFAULT_ALIGNMENT: u64 = 8;

    /// A read-only, reference-free object with default alignment.
    pub fn new(id: u32, size: u64) -> Self {
        Self {
            id: ObjectId(id),
            size,
            alignment: Self::DEFAULT_ALIGNMENT,
            writable: false,
            contains_references: false,
            relocatable: false,
        }
    }

    /// Mark the object writable.
    pub fn writable(mut self) -> Self {
        self.writable = true;
        self
    }

    /// Mark the object as carrying references.
    pub fn with_references(mut self) -> Self {
        self.contains_references = true;
        self
    }

    /// Mark the object as relocatable.
    pub fn relocatable(mut self) -> Self {
        self.relocatable = true;
        self
    }

    /// Override the start alignment.
    pub fn aligned_to(mut self, alignment: u64) -> Self {
        self.alignment = alignment;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_is_read_only_primitive() {
        let obj = ImageObject::new(1, 24);
        assert_eq!(obj.id, ObjectId(1));
        assert_eq!(obj.size, 24);
        assert_eq!(obj.alignment, ImageObject::DEFAULT_ALIGNMENT);
        assert!(!obj.writable);
        assert!(!obj.contains_references);
        assert!(!obj.relocatable);
    }

    #[test]
    fn builder_methods_compose() {
        let obj = ImageObject::new(2, 64)
            .writable()
            .with_references()
            .aligned_to(16);
        assert!(obj.writable);
        assert!(obj.contains_references);
        assert_eq!(obj.alignment, 16);
    }
}
