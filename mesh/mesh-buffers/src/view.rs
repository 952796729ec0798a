//! Non-owning vertex handles.

use std::ptr;

use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};

use crate::error::{BufferError, BufferResult};
use crate::kind::{AttributeKind, EXTRA_SLOTS};
use crate::store::AttributeBufferStore;
use crate::vertex::Vertex;

/// Read-only handle to one vertex of a store.
///
/// A view is a `(store, index)` pair. The index is checked once when the
/// view is created; because the view borrows the store, no insertion can
/// invalidate it while it is alive.
///
/// Two views are equal when they refer to the same slot of the same store,
/// regardless of the vertex data.
#[derive(Debug, Clone, Copy)]
pub struct VertexView<'a> {
    store: &'a AttributeBufferStore,
    index: usize,
}

impl<'a> VertexView<'a> {
    pub(crate) fn new(store: &'a AttributeBufferStore, index: usize) -> BufferResult<Self> {
        let len = store.vertex_count();
        if index >= len {
            return Err(BufferError::IndexOutOfBounds {
                kind: AttributeKind::Position,
                index,
                len,
            });
        }
        Ok(Self { store, index })
    }

    pub(crate) const fn new_unchecked(store: &'a AttributeBufferStore, index: usize) -> Self {
        Self { store, index }
    }

    /// Index of the vertex in the store.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The store this view reads from.
    #[inline]
    #[must_use]
    pub const fn store(&self) -> &'a AttributeBufferStore {
        self.store
    }

    /// Vertex position.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Point3<f32> {
        self.store.position_unchecked(self.index)
    }

    /// Vertex normal.
    #[inline]
    #[must_use]
    pub fn normal(&self) -> Vector3<f32> {
        self.store.normal_unchecked(self.index)
    }

    /// Vertex uv.
    #[inline]
    #[must_use]
    pub fn uv(&self) -> Vector2<f32> {
        self.store.uv_unchecked(self.index)
    }

    /// Vertex color.
    #[inline]
    #[must_use]
    pub fn color(&self) -> Vector4<f32> {
        self.store.color_unchecked(self.index)
    }

    /// Material matrix.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotImplemented`] without material buffers.
    pub fn material(&self) -> BufferResult<Matrix4<f32>> {
        self.store.material(self.index)
    }

    /// Extra slot value.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotImplemented`] when the slot is inactive.
    pub fn extra(&self, slot: usize) -> BufferResult<Vector4<f32>> {
        self.store.extra(self.index, slot)
    }

    /// Copy the vertex out into an owned record.
    #[must_use]
    pub fn to_vertex(&self) -> Vertex {
        self.store.vertex_unchecked(self.index)
    }
}

impl PartialEq for VertexView<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.store, other.store) && self.index == other.index
    }
}

impl Eq for VertexView<'_> {}

/// Read-write handle to one vertex of a store.
///
/// Every setter forwards straight to the store.
#[derive(Debug)]
pub struct VertexViewMut<'a> {
    store: &'a mut AttributeBufferStore,
    index: usize,
}

impl<'a> VertexViewMut<'a> {
    pub(crate) fn new(store: &'a mut AttributeBufferStore, index: usize) -> BufferResult<Self> {
        let len = store.vertex_count();
        if index >= len {
            return Err(BufferError::IndexOutOfBounds {
                kind: AttributeKind::Position,
                index,
                len,
            });
        }
        Ok(Self { store, index })
    }

    /// Index of the vertex in the store.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Reborrow as a read-only view.
    #[must_use]
    pub fn as_view(&self) -> VertexView<'_> {
        VertexView {
            store: &*self.store,
            index: self.index,
        }
    }

    /// Vertex position.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Point3<f32> {
        self.store.position_unchecked(self.index)
    }

    /// Vertex normal.
    #[inline]
    #[must_use]
    pub fn normal(&self) -> Vector3<f32> {
        self.store.normal_unchecked(self.index)
    }

    /// Vertex uv.
    #[inline]
    #[must_use]
    pub fn uv(&self) -> Vector2<f32> {
        self.store.uv_unchecked(self.index)
    }

    /// Vertex color.
    #[inline]
    #[must_use]
    pub fn color(&self) -> Vector4<f32> {
        self.store.color_unchecked(self.index)
    }

    /// Material matrix.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotImplemented`] without material buffers.
    pub fn material(&self) -> BufferResult<Matrix4<f32>> {
        self.store.material(self.index)
    }

    /// Extra slot value.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotImplemented`] when the slot is inactive.
    pub fn extra(&self, slot: usize) -> BufferResult<Vector4<f32>> {
        self.store.extra(self.index, slot)
    }

    /// Copy the vertex out into an owned record.
    #[must_use]
    pub fn to_vertex(&self) -> Vertex {
        self.store.vertex_unchecked(self.index)
    }

    /// Set the position.
    pub fn set_position(&mut self, value: Point3<f32>) {
        self.store.set_position_unchecked(self.index, value);
    }

    /// Set the normal.
    pub fn set_normal(&mut self, value: Vector3<f32>) {
        self.store.set_normal_unchecked(self.index, value);
    }

    /// Set the uv.
    pub fn set_uv(&mut self, value: Vector2<f32>) {
        self.store.set_uv_unchecked(self.index, value);
    }

    /// Set the color.
    pub fn set_color(&mut self, value: Vector4<f32>) {
        self.store.set_color_unchecked(self.index, value);
    }

    /// Set one color component.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IllegalArgument`] for a component outside `0..4`.
    pub fn set_color_component(&mut self, component: usize, value: f32) -> BufferResult<()> {
        self.store.set_color_component(self.index, component, value)
    }

    /// Set the material matrix.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotImplemented`] without material buffers.
    pub fn set_material(&mut self, value: Matrix4<f32>) -> BufferResult<()> {
        self.store.set_material(self.index, value)
    }

    /// Set an extra slot value.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotImplemented`] when the slot is inactive.
    pub fn set_extra(&mut self, slot: usize, value: Vector4<f32>) -> BufferResult<()> {
        self.store.set_extra(self.index, slot, value)
    }

    /// Set the first three components of an extra slot.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotImplemented`] when the slot is inactive.
    pub fn set_extra_xyz(&mut self, slot: usize, value: Vector3<f32>) -> BufferResult<()> {
        self.store.set_extra_xyz(self.index, slot, value)
    }

    /// Set one component of an extra slot.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotImplemented`] when the slot is inactive and
    /// [`BufferError::IllegalArgument`] for a component outside `0..4`.
    pub fn set_extra_component(&mut self, slot: usize, component: usize, value: f32) -> BufferResult<()> {
        self.store.set_extra_component(self.index, slot, component, value)
    }

    /// Overwrite the vertex from an owned record.
    ///
    /// Standard channels are always written. Material and extra slots are
    /// written when the record carries them; active slots the record leaves
    /// unset keep their current value.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotImplemented`] if the record carries a slot
    /// the store does not have. The vertex is left untouched in that case.
    pub fn set_vertex(&mut self, vertex: &Vertex) -> BufferResult<()> {
        if vertex.attributes.material.is_some() && !self.store.has_material() {
            return Err(BufferError::NotImplemented {
                operation: "set_vertex",
                kind: AttributeKind::Material1,
            });
        }
        for slot in 0..EXTRA_SLOTS {
            if vertex.attributes.extras[slot].is_some() && !self.store.has_extra(slot) {
                return Err(BufferError::NotImplemented {
                    operation: "set_vertex",
                    kind: AttributeKind::EXTRAS[slot],
                });
            }
        }

        self.set_position(vertex.position);
        self.set_normal(vertex.normal);
        self.set_uv(vertex.uv);
        self.set_color(vertex.color);
        if let Some(material) = vertex.attributes.material {
            self.set_material(material)?;
        }
        for (slot, extra) in vertex.attributes.extras.iter().enumerate() {
            if let Some(value) = extra {
                self.set_extra(slot, *value)?;
            }
        }
        Ok(())
    }

    /// Replace the position by `f(position)`.
    pub fn apply<F>(&mut self, f: F)
    where
        F: FnOnce(Point3<f32>) -> Point3<f32>,
    {
        let p = self.position();
        self.set_position(f(p));
    }

    /// Move the position by `offset`.
    pub fn translate(&mut self, offset: Vector3<f32>) {
        self.apply(|p| p + offset);
    }
}

impl AttributeBufferStore {
    /// Read-only view of a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfBounds`] if `index >= vertex_count()`.
    pub fn vertex_view(&self, index: usize) -> BufferResult<VertexView<'_>> {
        VertexView::new(self, index)
    }

    /// Read-write view of a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfBounds`] if `index >= vertex_count()`.
    pub fn vertex_view_mut(&mut self, index: usize) -> BufferResult<VertexViewMut<'_>> {
        VertexViewMut::new(self, index)
    }

    /// Views of every vertex, in index order.
    pub fn vertex_views(&self) -> impl Iterator<Item = VertexView<'_>> {
        (0..self.vertex_count()).map(move |index| VertexView::new_unchecked(self, index))
    }
}
