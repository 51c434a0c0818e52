//! Collaborator traits.

use crate::object::ImageObject;

/// The finished object set handed over by graph discovery.
///
/// Discovery may run multi-threaded, but by the time an `ImageHeap` is
/// passed to the layouter its contents are final and are only read.
pub trait ImageHeap {
    /// Every object in the image, in discovery order.
    ///
    /// The order is preserved within each partition, so a stable
    /// discovery order gives a reproducible image.
    fn objects(&self) -> &[ImageObject];

    /// Number of type-descriptor objects among [`ImageHeap::objects`].
    fn type_descriptor_count(&self) -> usize;
}
