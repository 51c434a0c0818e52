//! Test utilities and mock types for imgheap development.
//!
//! Provides a mock implementation of the [`ImageHeap`] collaborator and
//! the small configurations and object mixes used by the test suites
//! and benchmarks.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use imgheap_core::{ImageHeap, ImageObject};

/// Mock implementation of [`ImageHeap`].
///
/// Objects are handed out in push order. Ids are assigned sequentially
/// by [`push`](MockImageHeap::push) unless an object is added whole with
/// [`push_object`](MockImageHeap::push_object).
pub struct MockImageHeap {
    objects: Vec<ImageObject>,
    type_descriptors: usize,
    next_id: u32,
}

impl MockImageHeap {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            type_descriptors: 0,
            next_id: 0,
        }
    }

    /// Add an object of `size` bytes, shaped by `build`, under the next id.
    pub fn push(&mut self, size: u64, build: impl FnOnce(ImageObject) -> ImageObject) -> &mut Self {
        let object = build(ImageObject::new(self.next_id, size));
        self.push_object(object)
    }

    /// Add a fully built object.
    pub fn push_object(&mut self, object: ImageObject) -> &mut Self {
        self.next_id = self.next_id.max(object.id.0 + 1);
        self.objects.push(object);
        self
    }

    /// Add a read-only object with references, counted as a type descriptor.
    pub fn push_type_descriptor(&mut self, size: u64) -> &mut Self {
        self.type_descriptors += 1;
        self.push(size, ImageObject::with_references)
    }

    /// Number of objects pushed so far.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for MockImageHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageHeap for MockImageHeap {
    fn objects(&self) -> &[ImageObject] {
        &self.objects
    }

    fn type_descriptor_count(&self) -> usize {
        self.type_descriptors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential() {
        let mut heap = MockImageHeap::new();
        heap.push(8, |o| o).push(16, ImageObject::writable);
        heap.push_type_descriptor(24);
        let ids: Vec<u32> = heap.objects().iter().map(|o| o.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(heap.objects()[1].writable);
        assert_eq!(heap.type_descriptor_count(), 1);
    }
}
