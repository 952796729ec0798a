//! Render buffer export.
//!
//! The byte layout of every binding is a fixed contract toward the GPU
//! upload layer: all components are native-endian 32-bit values, tightly
//! packed, one element per vertex (or per triangle for the index binding).

use crate::kind::AttributeKind;
use crate::store::AttributeBufferStore;

/// One contiguous buffer ready for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderBinding<'a> {
    /// Attribute kind the buffer holds.
    pub kind: AttributeKind,
    /// Raw bytes.
    pub bytes: &'a [u8],
    /// Number of elements (vertices, or triangles for [`AttributeKind::Index`]).
    pub element_count: usize,
}

impl RenderBinding<'_> {
    /// Total byte length.
    #[inline]
    #[must_use]
    pub fn byte_size(&self) -> usize {
        self.bytes.len()
    }

    /// Byte size of one element.
    #[inline]
    #[must_use]
    pub const fn stride(&self) -> usize {
        self.kind.element_size()
    }

    /// Raw pointer to the first byte.
    ///
    /// The pointer is invalidated when the store grows beyond its reserved
    /// capacity.
    #[inline]
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }
}

impl AttributeBufferStore {
    /// One binding per active kind, in export order.
    ///
    /// The material matrix is exported as four column bindings
    /// (`Material1..4`), and the index buffer as one `Index` binding.
    #[must_use]
    pub fn render_bindings(&self) -> Vec<RenderBinding<'_>> {
        self.attributes()
            .kinds()
            .filter_map(|kind| {
                let bytes = self.buffer_bytes(kind).ok()?;
                Some(RenderBinding {
                    kind,
                    bytes,
                    element_count: self.buffer_length(kind),
                })
            })
            .collect()
    }

    /// Index buffer as raw bytes.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.index_buffer())
    }
}
