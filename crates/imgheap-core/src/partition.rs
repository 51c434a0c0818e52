//! The seven image heap partitions and their canonical order.
//!
//! Every object lands in exactly one partition. Partitions are laid out
//! in [`PartitionKind::ALL`] order, which puts every read-only partition
//! before every writable one. The runtime protects memory and installs
//! write barriers based on a single read-only/writable boundary address,
//! so this order is part of the image format.

use std::fmt;

use crate::object::ImageObject;

/// Whether a region may be mutated once the image is mapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Writability {
    /// Never written after load.
    ReadOnly,
    /// May be written after load; needs a remembered set.
    Writable,
}

impl Writability {
    /// Both classes, read-only first.
    pub const ALL: [Writability; 2] = [Writability::ReadOnly, Writability::Writable];

    /// Dense index for per-class tables.
    pub fn index(self) -> usize {
        match self {
            Self::ReadOnly => 0,
            Self::Writable => 1,
        }
    }

    /// `true` for [`Writability::Writable`].
    pub fn is_writable(self) -> bool {
        self == Self::Writable
    }
}

impl From<bool> for Writability {
    fn from(writable: bool) -> Self {
        if writable {
            Self::Writable
        } else {
            Self::ReadOnly
        }
    }
}

/// One homogeneous bucket of the image heap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartitionKind {
    /// Read-only objects without references.
    ReadOnlyPrimitive,
    /// Read-only objects with references.
    ReadOnlyReference,
    /// Read-only objects holding loader-relocated pointers.
    ReadOnlyRelocatable,
    /// Read-only objects at or above the huge-object threshold.
    ReadOnlyHuge,
    /// Writable objects without references.
    WritablePrimitive,
    /// Writable objects with references.
    WritableReference,
    /// Writable objects at or above the huge-object threshold.
    WritableHuge,
}

impl PartitionKind {
    /// Canonical layout order.
    pub const ALL: [PartitionKind; 7] = [
        PartitionKind::ReadOnlyPrimitive,
        PartitionKind::ReadOnlyReference,
        PartitionKind::ReadOnlyRelocatable,
        PartitionKind::ReadOnlyHuge,
        PartitionKind::WritablePrimitive,
        PartitionKind::WritableReference,
        PartitionKind::WritableHuge,
    ];

    /// Stable, human-readable partition name.
    pub fn name(self) -> &'static str {
        match self {
            Self::ReadOnlyPrimitive => "readOnlyPrimitive",
            Self::ReadOnlyReference => "readOnlyReference",
            Self::ReadOnlyRelocatable => "readOnlyRelocatable",
            Self::ReadOnlyHuge => "readOnlyHuge",
            Self::WritablePrimitive => "writablePrimitive",
            Self::WritableReference => "writableReference",
            Self::WritableHuge => "writableHuge",
        }
    }

    /// Writability class of every object in this partition.
    pub fn writability(self) -> Writability {
        match self {
            Self::ReadOnlyPrimitive
            | Self::ReadOnlyReference
            | Self::ReadOnlyRelocatable
            | Self::ReadOnlyHuge => Writability::ReadOnly,
            Self::WritablePrimitive | Self::WritableReference | Self::WritableHuge => {
                Writability::Writable
            }
        }
    }

    /// Shorthand for `self.writability().is_writable()`.
    pub fn is_writable(self) -> bool {
        self.writability().is_writable()
    }

    /// Whether this partition holds only huge objects (one per unaligned chunk).
    pub fn holds_huge_objects(self) -> bool {
        matches!(self, Self::ReadOnlyHuge | Self::WritableHuge)
    }

    /// Whether objects in this partition may carry references.
    ///
    /// Informational only; huge partitions are conservatively `true`.
    pub fn contains_references(self) -> bool {
        !matches!(self, Self::ReadOnlyPrimitive | Self::WritablePrimitive)
    }

    /// Choose the partition for `object` given the huge-object threshold.
    ///
    /// Size is tested first, so an object at or above the threshold is
    /// always routed to a huge partition regardless of its other flags.
    pub fn classify(object: &ImageObject, huge_object_threshold: u64) -> Self {
        let huge = object.size >= huge_object_threshold;
        if object.writable {
            if huge {
                Self::WritableHuge
            } else if object.contains_references {
                Self::WritableReference
            } else {
                Self::WritablePrimitive
            }
        } else if huge {
            Self::ReadOnlyHuge
        } else if object.relocatable {
            Self::ReadOnlyRelocatable
        } else if object.contains_references {
            Self::ReadOnlyReference
        } else {
            Self::ReadOnlyPrimitive
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_puts_read_only_first() {
        let first_writable = PartitionKind::ALL
            .iter()
            .position(|k| k.is_writable())
            .unwrap();
        assert!(PartitionKind::ALL[..first_writable]
            .iter()
            .all(|k| !k.is_writable()));
        assert!(PartitionKind::ALL[first_writable..]
            .iter()
            .all(|k| k.is_writable()));
    }

    #[test]
    fn classify_routes_by_size_first() {
        let big = ImageObject::new(0, 4096).relocatable().with_references();
        assert_eq!(PartitionKind::classify(&big, 1024), PartitionKind::ReadOnlyHuge);
        let big_w = ImageObject::new(1, 1024).writable();
        assert_eq!(PartitionKind::classify(&big_w, 1024), PartitionKind::WritableHuge);
    }

    #[test]
    fn classify_read_only_small_objects() {
        let t = 1024;
        assert_eq!(
            PartitionKind::classify(&ImageObject::new(0, 16), t),
            PartitionKind::ReadOnlyPrimitive
        );
        assert_eq!(
            PartitionKind::classify(&ImageObject::new(0, 16).with_references(), t),
            PartitionKind::ReadOnlyReference
        );
        assert_eq!(
            PartitionKind::classify(&ImageObject::new(0, 16).with_references().relocatable(), t),
            PartitionKind::ReadOnlyRelocatable
        );
    }

    #[test]
    fn classify_writable_small_objects() {
        let t = 1024;
        assert_eq!(
            PartitionKind::classify(&ImageObject::new(0, 16).writable(), t),
            PartitionKind::WritablePrimitive
        );
        // Relocatable has no writable counterpart.
        assert_eq!(
            PartitionKind::classify(
                &ImageObject::new(0, 16).writable().with_references().relocatable(),
                t
            ),
            PartitionKind::WritableReference
        );
    }

    #[test]
    fn writability_index_is_dense() {
        for (i, w) in Writability::ALL.iter().enumerate() {
            assert_eq!(w.index(), i);
        }
        assert_eq!(Writability::from(true), Writability::Writable);
    }

    #[test]
    fn names_are_distinct() {
        let names: std::collections::HashSet<_> =
            PartitionKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names.len(), 7);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn classify_preserves_writability_and_size_class(
                size in 1u64..8192,
                threshold in 1u64..4096,
                writable in any::<bool>(),
                refs in any::<bool>(),
                reloc in any::<bool>(),
            ) {
                let mut obj = ImageObject::new(0, size);
                obj.writable = writable;
                obj.contains_references = refs;
                obj.relocatable = reloc;
                let kind = PartitionKind::classify(&obj, threshold);
                prop_assert_eq!(kind.is_writable(), writable);
                prop_assert_eq!(kind.holds_huge_objects(), size >= threshold);
            }
        }
    }
}
