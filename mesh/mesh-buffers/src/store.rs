//! Struct-of-arrays attribute store.

use nalgebra::{Matrix4, Point3, Vector2, Vector3, Vector4};
use tracing::debug;

use crate::error::{BufferError, BufferResult};
use crate::kind::{AttributeKind, AttributeSet, EXTRA_SLOTS, MATERIAL_COLUMNS};
use crate::vertex::Vertex;

/// Contiguous per-kind vertex buffers plus the triangle index buffer.
///
/// This is the single source of truth for vertex and triangle data. Each
/// active kind lives in its own tightly packed `Vec` so that it can be
/// handed to a GPU upload layer without repacking (see
/// [`render_bindings`](Self::render_bindings)).
///
/// # Invariants
///
/// - every active vertex buffer has length [`vertex_count`](Self::vertex_count);
/// - the index buffer has length [`triangle_count`](Self::triangle_count);
/// - every stored vertex index is `< vertex_count`.
///
/// # Storage growth
///
/// Buffers grow by appending. Growth beyond the reserved capacity may move
/// the backing allocation, which invalidates any raw pointer previously
/// obtained from [`buffer_bytes`](Self::buffer_bytes). Call
/// [`reserve`](Self::reserve) before bulk insertion when such pointers are
/// retained.
///
/// # Example
///
/// ```
/// use mesh_buffers::{AttributeBufferStore, Vertex};
///
/// let mut store = AttributeBufferStore::new();
/// store.reserve(3);
/// for x in 0..3 {
///     store.add_vertex(&Vertex::from_coords(x as f32, 0.0, 0.0))?;
/// }
/// let slot = store.add_triangle_indices([0, 1, 2], 0)?;
///
/// assert_eq!(store.vertex_count(), 3);
/// assert_eq!(store.face_indices(slot)?, [0, 1, 2]);
/// # Ok::<(), mesh_buffers::BufferError>(())
/// ```
#[derive(Debug, Clone)]
pub struct AttributeBufferStore {
    attributes: AttributeSet,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    uvs: Vec<[f32; 2]>,
    colors: Vec<[f32; 4]>,
    materials: [Vec<[f32; 4]>; MATERIAL_COLUMNS],
    extras: [Vec<[f32; 4]>; EXTRA_SLOTS],
    indices: Vec<[u32; 3]>,
}

impl Default for AttributeBufferStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeBufferStore {
    /// Create an empty store with the standard attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            attributes: AttributeSet::standard(),
            positions: Vec::new(),
            normals: Vec::new(),
            uvs: Vec::new(),
            colors: Vec::new(),
            materials: Default::default(),
            extras: Default::default(),
            indices: Vec::new(),
        }
    }

    /// Create an empty store with an explicit attribute set.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IllegalArgument`] if the set lacks a standard
    /// kind or enables only part of the material columns.
    pub fn with_attributes(attributes: AttributeSet) -> BufferResult<Self> {
        attributes.validate().map_err(BufferError::IllegalArgument)?;
        Ok(Self {
            attributes,
            ..Self::new()
        })
    }

    /// Create an empty store with optional material columns and extra slots.
    ///
    /// Extra slot numbers outside `0..EXTRA_SLOTS` are ignored.
    #[must_use]
    pub fn with_material(material: bool, extra_slots: &[usize]) -> Self {
        let mut attributes = AttributeSet::standard();
        if material {
            attributes = attributes.with_material();
        }
        for &slot in extra_slots {
            attributes = attributes.with_extra(slot);
        }
        Self {
            attributes,
            ..Self::new()
        }
    }

    // ---------------------------------------------------------------------
    // Shape queries
    // ---------------------------------------------------------------------

    /// The active attribute set.
    #[inline]
    #[must_use]
    pub const fn attributes(&self) -> AttributeSet {
        self.attributes
    }

    /// Check whether a kind is active.
    #[inline]
    #[must_use]
    pub const fn is_active(&self, kind: AttributeKind) -> bool {
        self.attributes.has(kind)
    }

    /// Check whether the material columns are active.
    #[inline]
    #[must_use]
    pub const fn has_material(&self) -> bool {
        self.attributes.contains(AttributeSet::MATERIAL)
    }

    /// Check whether an extra slot is active.
    #[must_use]
    pub fn has_extra(&self, slot: usize) -> bool {
        AttributeKind::extra(slot).is_some_and(|kind| self.is_active(kind))
    }

    /// Check whether two stores carry the same attribute set.
    #[inline]
    #[must_use]
    pub fn is_compatible(&self, other: &Self) -> bool {
        self.attributes == other.attributes
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Current vertex capacity (the smallest across active vertex buffers).
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.attributes
            .kinds()
            .filter(|kind| *kind != AttributeKind::Index)
            .map(|kind| self.buffer_capacity(kind))
            .min()
            .unwrap_or(0)
    }

    /// Element count of one buffer; zero for inactive kinds.
    #[must_use]
    pub fn buffer_length(&self, kind: AttributeKind) -> usize {
        if !self.is_active(kind) {
            return 0;
        }
        match kind {
            AttributeKind::Position => self.positions.len(),
            AttributeKind::Normal => self.normals.len(),
            AttributeKind::Uv => self.uvs.len(),
            AttributeKind::Color => self.colors.len(),
            AttributeKind::Index => self.indices.len(),
            k if k.is_material() => self.materials[material_column(k)].len(),
            k => k.extra_slot().map_or(0, |slot| self.extras[slot].len()),
        }
    }

    /// Byte size of one buffer; zero for inactive kinds.
    #[must_use]
    pub fn buffer_size(&self, kind: AttributeKind) -> usize {
        self.buffer_length(kind) * kind.element_size()
    }

    fn buffer_capacity(&self, kind: AttributeKind) -> usize {
        match kind {
            AttributeKind::Position => self.positions.capacity(),
            AttributeKind::Normal => self.normals.capacity(),
            AttributeKind::Uv => self.uvs.capacity(),
            AttributeKind::Color => self.colors.capacity(),
            AttributeKind::Index => self.indices.capacity(),
            k if k.is_material() => self.materials[material_column(k)].capacity(),
            k => k.extra_slot().map_or(0, |slot| self.extras[slot].capacity()),
        }
    }

    // ---------------------------------------------------------------------
    // Growth
    // ---------------------------------------------------------------------

    /// Reserve room for `additional` more vertices in every active buffer.
    pub fn reserve(&mut self, additional: usize) {
        self.positions.reserve(additional);
        self.normals.reserve(additional);
        self.uvs.reserve(additional);
        self.colors.reserve(additional);
        if self.has_material() {
            for column in &mut self.materials {
                column.reserve(additional);
            }
        }
        for (slot, extra) in self.extras.iter_mut().enumerate() {
            if self.attributes.with_extra(slot) == self.attributes {
                extra.reserve(additional);
            }
        }
    }

    /// Reserve room for `additional` more triangles.
    pub fn reserve_triangles(&mut self, additional: usize) {
        self.indices.reserve(additional);
    }

    /// Append a vertex to every active buffer.
    ///
    /// The record must carry exactly the optional data the store expects: a
    /// material matrix iff material columns are active, and a value for each
    /// active extra slot and no other.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IllegalArgument`] when the record's attributes
    /// do not match the active set; nothing is appended in that case.
    pub fn add_vertex(&mut self, vertex: &Vertex) -> BufferResult<usize> {
        self.check_vertex(vertex, true)?;
        Ok(self.push_vertex(vertex))
    }

    /// Append a vertex, default-filling active slots the record leaves unset.
    ///
    /// Missing material columns and extra slots are filled with zeros.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IllegalArgument`] when the record carries data
    /// for a slot the store does not have.
    pub fn add_vertex_filled(&mut self, vertex: &Vertex) -> BufferResult<usize> {
        self.check_vertex(vertex, false)?;
        Ok(self.push_vertex(vertex))
    }

    /// Append a vertex from its standard channels only.
    ///
    /// Any active material or extra buffer receives zeros.
    pub fn add_standard(
        &mut self,
        position: Point3<f32>,
        normal: Vector3<f32>,
        uv: Vector2<f32>,
        color: Vector4<f32>,
    ) -> usize {
        self.push_vertex(&Vertex::new(position, normal, uv, color))
    }

    /// Check whether a record can be added without changing the store.
    ///
    /// With `strict` the record must carry exactly the active optional
    /// slots; otherwise it may leave active slots unset.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IllegalArgument`] describing the mismatch.
    pub fn check_vertex(&self, vertex: &Vertex, strict: bool) -> BufferResult<()> {
        let attributes = &vertex.attributes;
        match (attributes.material.is_some(), self.has_material()) {
            (true, false) => {
                return Err(BufferError::IllegalArgument(
                    "vertex carries a material but the store has no material buffers".into(),
                ));
            }
            (false, true) if strict => {
                return Err(BufferError::IllegalArgument(
                    "store has material buffers but the vertex carries no material".into(),
                ));
            }
            _ => {}
        }
        for (slot, extra) in attributes.extras.iter().enumerate() {
            match (extra.is_some(), self.has_extra(slot)) {
                (true, false) => {
                    return Err(BufferError::IllegalArgument(format!(
                        "vertex carries extra{slot} but the store has no such buffer"
                    )));
                }
                (false, true) if strict => {
                    return Err(BufferError::IllegalArgument(format!(
                        "store has an extra{slot} buffer but the vertex carries no value"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn push_vertex(&mut self, vertex: &Vertex) -> usize {
        let index = self.positions.len();
        self.positions.push(vertex.position.coords.into());
        self.normals.push(vertex.normal.into());
        self.uvs.push(vertex.uv.into());
        self.colors.push(vertex.color.into());

        if self.has_material() {
            let material = vertex.attributes.material.unwrap_or_else(Matrix4::zeros);
            for (c, column) in self.materials.iter_mut().enumerate() {
                column.push(material.column(c).into_owned().into());
            }
        }
        for slot in 0..EXTRA_SLOTS {
            if self.has_extra(slot) {
                let value = vertex.attributes.extras[slot].unwrap_or_else(Vector4::zeros);
                self.extras[slot].push(value.into());
            }
        }
        index
    }

    /// Append a triangle, storing `indices + shift`.
    ///
    /// The shift lets callers build triangles against a locally numbered
    /// vertex list and offset them into global numbering.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfBounds`] if a shifted index does not
    /// name an existing vertex.
    pub fn add_triangle_indices(&mut self, indices: [u32; 3], shift: u32) -> BufferResult<usize> {
        let shifted = indices.map(|i| i.wrapping_add(shift));
        self.check_indices(shifted, indices.map(|i| u64::from(i) + u64::from(shift)))?;
        self.indices.push(shifted);
        Ok(self.indices.len() - 1)
    }

    fn check_indices(&self, indices: [u32; 3], exact: [u64; 3]) -> BufferResult<()> {
        let len = self.vertex_count();
        for (i, e) in indices.iter().zip(exact) {
            if e > u64::from(u32::MAX) || *i as usize >= len {
                return Err(BufferError::IndexOutOfBounds {
                    kind: AttributeKind::Position,
                    index: usize::try_from(e).unwrap_or(usize::MAX),
                    len,
                });
            }
        }
        Ok(())
    }

    /// Append every vertex and triangle of `other`, returning the index
    /// shift applied to `other`'s triangles.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IncompatibleAttributes`] when the attribute
    /// sets differ, and [`BufferError::IllegalArgument`] if the combined
    /// vertex count no longer fits a 32-bit index.
    pub fn append_store(&mut self, other: &Self) -> BufferResult<u32> {
        if !self.is_compatible(other) {
            return Err(BufferError::IncompatibleAttributes {
                left: self.attributes,
                right: other.attributes,
            });
        }
        let shift = self.index_shift()?;
        u32::try_from(self.vertex_count() + other.vertex_count()).map_err(|_| {
            BufferError::IllegalArgument("combined vertex count exceeds the u32 index range".into())
        })?;

        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.uvs.extend_from_slice(&other.uvs);
        self.colors.extend_from_slice(&other.colors);
        for (mine, theirs) in self.materials.iter_mut().zip(&other.materials) {
            mine.extend_from_slice(theirs);
        }
        for (mine, theirs) in self.extras.iter_mut().zip(&other.extras) {
            mine.extend_from_slice(theirs);
        }
        self.indices
            .extend(other.indices.iter().map(|tri| tri.map(|i| i + shift)));

        debug!(
            "Appended store: {} vertices, {} triangles at shift {}",
            other.vertex_count(),
            other.triangle_count(),
            shift
        );
        Ok(shift)
    }

    /// The current vertex count as a 32-bit index shift.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IllegalArgument`] if the store holds more
    /// vertices than a 32-bit index can address.
    pub fn index_shift(&self) -> BufferResult<u32> {
        u32::try_from(self.vertex_count()).map_err(|_| {
            BufferError::IllegalArgument("vertex count exceeds the u32 index range".into())
        })
    }

    // ---------------------------------------------------------------------
    // Access
    // ---------------------------------------------------------------------

    fn check(&self, kind: AttributeKind, index: usize, operation: &'static str) -> BufferResult<()> {
        if !self.is_active(kind) {
            return Err(BufferError::NotImplemented { operation, kind });
        }
        let len = self.buffer_length(kind);
        if index >= len {
            return Err(BufferError::IndexOutOfBounds { kind, index, len });
        }
        Ok(())
    }

    /// Position of a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfBounds`] if `index >= vertex_count()`.
    pub fn position(&self, index: usize) -> BufferResult<Point3<f32>> {
        self.check(AttributeKind::Position, index, "position")?;
        Ok(self.position_unchecked(index))
    }

    /// Normal of a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfBounds`] if `index >= vertex_count()`.
    pub fn normal(&self, index: usize) -> BufferResult<Vector3<f32>> {
        self.check(AttributeKind::Normal, index, "normal")?;
        Ok(self.normal_unchecked(index))
    }

    /// UV of a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfBounds`] if `index >= vertex_count()`.
    pub fn uv(&self, index: usize) -> BufferResult<Vector2<f32>> {
        self.check(AttributeKind::Uv, index, "uv")?;
        Ok(self.uv_unchecked(index))
    }

    /// Color of a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfBounds`] if `index >= vertex_count()`.
    pub fn color(&self, index: usize) -> BufferResult<Vector4<f32>> {
        self.check(AttributeKind::Color, index, "color")?;
        Ok(self.color_unchecked(index))
    }

    /// Material matrix of a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotImplemented`] without material buffers and
    /// [`BufferError::IndexOutOfBounds`] for a bad index.
    pub fn material(&self, index: usize) -> BufferResult<Matrix4<f32>> {
        self.check(AttributeKind::Material1, index, "material")?;
        Ok(self.material_unchecked(index))
    }

    /// Value of an extra slot.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotImplemented`] when the slot is inactive and
    /// [`BufferError::IndexOutOfBounds`] for a bad index.
    pub fn extra(&self, index: usize, slot: usize) -> BufferResult<Vector4<f32>> {
        let kind = extra_kind(slot, "extra")?;
        self.check(kind, index, "extra")?;
        Ok(Vector4::from(self.extras[slot][index]))
    }

    /// Vertex indices of a triangle.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfBounds`] if `slot >= triangle_count()`.
    pub fn face_indices(&self, slot: usize) -> BufferResult<[u32; 3]> {
        self.check(AttributeKind::Index, slot, "face_indices")?;
        Ok(self.indices[slot])
    }

    /// Read back a full vertex record, with every active optional slot set.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfBounds`] if `index >= vertex_count()`.
    pub fn vertex(&self, index: usize) -> BufferResult<Vertex> {
        self.check(AttributeKind::Position, index, "vertex")?;
        Ok(self.vertex_unchecked(index))
    }

    /// Set the position of a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfBounds`] if `index >= vertex_count()`.
    pub fn set_position(&mut self, index: usize, value: Point3<f32>) -> BufferResult<()> {
        self.check(AttributeKind::Position, index, "set_position")?;
        self.positions[index] = value.coords.into();
        Ok(())
    }

    /// Set the normal of a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfBounds`] if `index >= vertex_count()`.
    pub fn set_normal(&mut self, index: usize, value: Vector3<f32>) -> BufferResult<()> {
        self.check(AttributeKind::Normal, index, "set_normal")?;
        self.normals[index] = value.into();
        Ok(())
    }

    /// Set the uv of a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfBounds`] if `index >= vertex_count()`.
    pub fn set_uv(&mut self, index: usize, value: Vector2<f32>) -> BufferResult<()> {
        self.check(AttributeKind::Uv, index, "set_uv")?;
        self.uvs[index] = value.into();
        Ok(())
    }

    /// Set the color of a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfBounds`] if `index >= vertex_count()`.
    pub fn set_color(&mut self, index: usize, value: Vector4<f32>) -> BufferResult<()> {
        self.check(AttributeKind::Color, index, "set_color")?;
        self.colors[index] = value.into();
        Ok(())
    }

    /// Set one component of a vertex color.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfBounds`] for a bad vertex index and
    /// [`BufferError::IllegalArgument`] for a component outside `0..4`.
    pub fn set_color_component(
        &mut self,
        index: usize,
        component: usize,
        value: f32,
    ) -> BufferResult<()> {
        self.check(AttributeKind::Color, index, "set_color_component")?;
        let entry = self.colors[index].get_mut(component).ok_or_else(|| {
            BufferError::IllegalArgument(format!("color has no component {component}"))
        })?;
        *entry = value;
        Ok(())
    }

    /// Set the material matrix of a vertex.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotImplemented`] without material buffers and
    /// [`BufferError::IndexOutOfBounds`] for a bad index.
    pub fn set_material(&mut self, index: usize, value: Matrix4<f32>) -> BufferResult<()> {
        self.check(AttributeKind::Material1, index, "set_material")?;
        for (c, column) in self.materials.iter_mut().enumerate() {
            column[index] = value.column(c).into_owned().into();
        }
        Ok(())
    }

    /// Set an extra slot value.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotImplemented`] when the slot is inactive and
    /// [`BufferError::IndexOutOfBounds`] for a bad index.
    pub fn set_extra(&mut self, index: usize, slot: usize, value: Vector4<f32>) -> BufferResult<()> {
        let kind = extra_kind(slot, "set_extra")?;
        self.check(kind, index, "set_extra")?;
        self.extras[slot][index] = value.into();
        Ok(())
    }

    /// Set the first three components of an extra slot, keeping the fourth.
    ///
    /// # Errors
    ///
    /// Same as [`set_extra`](Self::set_extra).
    pub fn set_extra_xyz(&mut self, index: usize, slot: usize, value: Vector3<f32>) -> BufferResult<()> {
        let kind = extra_kind(slot, "set_extra_xyz")?;
        self.check(kind, index, "set_extra_xyz")?;
        let entry = &mut self.extras[slot][index];
        entry[..3].copy_from_slice(value.as_slice());
        Ok(())
    }

    /// Set one component of an extra slot.
    ///
    /// # Errors
    ///
    /// Same as [`set_extra`](Self::set_extra), plus
    /// [`BufferError::IllegalArgument`] for a component outside `0..4`.
    pub fn set_extra_component(
        &mut self,
        index: usize,
        slot: usize,
        component: usize,
        value: f32,
    ) -> BufferResult<()> {
        let kind = extra_kind(slot, "set_extra_component")?;
        self.check(kind, index, "set_extra_component")?;
        let entry = self.extras[slot][index].get_mut(component).ok_or_else(|| {
            BufferError::IllegalArgument(format!("extra{slot} has no component {component}"))
        })?;
        *entry = value;
        Ok(())
    }

    /// Overwrite the vertex indices of a triangle.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfBounds`] for a bad slot or when an
    /// index does not name an existing vertex.
    pub fn set_face_indices(&mut self, slot: usize, indices: [u32; 3]) -> BufferResult<()> {
        self.check(AttributeKind::Index, slot, "set_face_indices")?;
        self.check_indices(indices, indices.map(u64::from))?;
        self.indices[slot] = indices;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Unchecked access for views, whose index was validated on creation.
    // ---------------------------------------------------------------------

    pub(crate) fn position_unchecked(&self, index: usize) -> Point3<f32> {
        Point3::from(self.positions[index])
    }

    pub(crate) fn normal_unchecked(&self, index: usize) -> Vector3<f32> {
        Vector3::from(self.normals[index])
    }

    pub(crate) fn uv_unchecked(&self, index: usize) -> Vector2<f32> {
        Vector2::from(self.uvs[index])
    }

    pub(crate) fn color_unchecked(&self, index: usize) -> Vector4<f32> {
        Vector4::from(self.colors[index])
    }

    pub(crate) fn material_unchecked(&self, index: usize) -> Matrix4<f32> {
        Matrix4::from_columns(&self.materials.each_ref().map(|c| Vector4::from(c[index])))
    }

    pub(crate) fn vertex_unchecked(&self, index: usize) -> Vertex {
        let mut vertex = Vertex::new(
            self.position_unchecked(index),
            self.normal_unchecked(index),
            self.uv_unchecked(index),
            self.color_unchecked(index),
        );
        if self.has_material() {
            vertex.attributes.material = Some(self.material_unchecked(index));
        }
        for slot in 0..EXTRA_SLOTS {
            if self.has_extra(slot) {
                vertex.attributes.extras[slot] = Some(Vector4::from(self.extras[slot][index]));
            }
        }
        vertex
    }

    pub(crate) fn set_position_unchecked(&mut self, index: usize, value: Point3<f32>) {
        self.positions[index] = value.coords.into();
    }

    pub(crate) fn set_normal_unchecked(&mut self, index: usize, value: Vector3<f32>) {
        self.normals[index] = value.into();
    }

    pub(crate) fn set_uv_unchecked(&mut self, index: usize, value: Vector2<f32>) {
        self.uvs[index] = value.into();
    }

    pub(crate) fn set_color_unchecked(&mut self, index: usize, value: Vector4<f32>) {
        self.colors[index] = value.into();
    }

    pub(crate) fn face_indices_unchecked(&self, slot: usize) -> [u32; 3] {
        self.indices[slot]
    }

    pub(crate) fn set_face_indices_unchecked(&mut self, slot: usize, indices: [u32; 3]) {
        self.indices[slot] = indices;
    }

    // ---------------------------------------------------------------------
    // Raw buffers
    // ---------------------------------------------------------------------

    /// Raw bytes of one buffer, tightly packed in the layout of
    /// [`AttributeKind::element_size`].
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::NotImplemented`] for an inactive kind.
    pub fn buffer_bytes(&self, kind: AttributeKind) -> BufferResult<&[u8]> {
        if !self.is_active(kind) {
            return Err(BufferError::NotImplemented {
                operation: "buffer_bytes",
                kind,
            });
        }
        let bytes: &[u8] = match kind {
            AttributeKind::Position => bytemuck::cast_slice(&self.positions),
            AttributeKind::Normal => bytemuck::cast_slice(&self.normals),
            AttributeKind::Uv => bytemuck::cast_slice(&self.uvs),
            AttributeKind::Color => bytemuck::cast_slice(&self.colors),
            AttributeKind::Index => bytemuck::cast_slice(&self.indices),
            k if k.is_material() => bytemuck::cast_slice(&self.materials[material_column(k)]),
            k => match k.extra_slot() {
                Some(slot) => bytemuck::cast_slice(&self.extras[slot]),
                None => &[],
            },
        };
        Ok(bytes)
    }

    /// Triangle index buffer as stored.
    #[must_use]
    pub fn index_buffer(&self) -> &[[u32; 3]] {
        &self.indices
    }
}

fn material_column(kind: AttributeKind) -> usize {
    AttributeKind::MATERIAL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or(0)
}

fn extra_kind(slot: usize, operation: &'static str) -> BufferResult<AttributeKind> {
    AttributeKind::extra(slot).ok_or_else(|| {
        BufferError::IllegalArgument(format!("{operation}: no extra slot {slot}"))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn sample_vertex(x: f32) -> Vertex {
        Vertex::new(
            Point3::new(x, 2.0 * x, -x),
            Vector3::new(0.0, 0.0, 1.0),
            Vector2::new(x, 0.5),
            Vector4::new(0.1, 0.2, 0.3, 1.0),
        )
    }

    #[test]
    fn add_vertex_round_trip() {
        let mut store = AttributeBufferStore::new();
        let v = sample_vertex(1.5);
        let i = store.add_vertex(&v).unwrap();
        assert_eq!(i, 0);
        assert_eq!(store.position(i).unwrap(), v.position);
        assert_eq!(store.normal(i).unwrap(), v.normal);
        assert_eq!(store.uv(i).unwrap(), v.uv);
        assert_eq!(store.color(i).unwrap(), v.color);
        assert_eq!(store.vertex(i).unwrap(), v);
    }

    #[test]
    fn buffers_stay_equal_length() {
        let mut store = AttributeBufferStore::with_material(true, &[0, 3]);
        for k in 0..5 {
            store.add_standard(
                Point3::new(k as f32, 0.0, 0.0),
                Vector3::z(),
                Vector2::zeros(),
                Vector4::zeros(),
            );
        }
        for kind in store.attributes().kinds() {
            if kind != AttributeKind::Index {
                assert_eq!(store.buffer_length(kind), 5, "{kind}");
            }
        }
        assert_eq!(store.buffer_length(AttributeKind::Extra1), 0);
        assert_eq!(store.extra(4, 3).unwrap(), Vector4::zeros());
    }

    #[test]
    fn strict_add_rejects_mismatched_records() {
        let mut store = AttributeBufferStore::with_material(false, &[1]);
        let plain = sample_vertex(0.0);
        assert!(matches!(
            store.add_vertex(&plain),
            Err(BufferError::IllegalArgument(_))
        ));
        assert_eq!(store.vertex_count(), 0);

        let with_extra = plain.clone().with_extra(1, Vector4::x());
        assert_eq!(store.add_vertex(&with_extra).unwrap(), 0);

        let wrong_slot = plain.with_extra(2, Vector4::x());
        assert!(store.add_vertex_filled(&wrong_slot).is_err());
    }

    #[test]
    fn filled_add_defaults_missing_slots() {
        let mut store = AttributeBufferStore::with_material(true, &[]);
        let i = store.add_vertex_filled(&sample_vertex(1.0)).unwrap();
        assert_eq!(store.material(i).unwrap(), Matrix4::zeros());
    }

    #[test]
    fn material_round_trip() {
        let mut store = AttributeBufferStore::with_material(true, &[]);
        let m = Matrix4::new(
            1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0,
        );
        let i = store.add_vertex(&sample_vertex(0.0).with_material(m)).unwrap();
        assert_eq!(store.material(i).unwrap(), m);
        assert_eq!(
            store.buffer_bytes(AttributeKind::Material2).unwrap().len(),
            16
        );
    }

    #[test]
    fn getters_report_index_and_length() {
        let mut store = AttributeBufferStore::new();
        store.add_vertex(&sample_vertex(0.0)).unwrap();
        let err = store.normal(4).unwrap_err();
        assert_eq!(
            err,
            BufferError::IndexOutOfBounds {
                kind: AttributeKind::Normal,
                index: 4,
                len: 1
            }
        );
        assert!(store.set_uv(1, Vector2::zeros()).is_err());
    }

    #[test]
    fn inactive_slot_is_not_implemented() {
        let mut store = AttributeBufferStore::new();
        store.add_vertex(&sample_vertex(0.0)).unwrap();
        assert!(matches!(
            store.extra(0, 0),
            Err(BufferError::NotImplemented { .. })
        ));
        assert!(matches!(
            store.set_extra(0, 9, Vector4::zeros()),
            Err(BufferError::IllegalArgument(_))
        ));
        assert!(matches!(
            store.material(0),
            Err(BufferError::NotImplemented { .. })
        ));
    }

    #[test]
    fn triangle_indices_with_shift() {
        let mut store = AttributeBufferStore::new();
        for i in 0..6 {
            store.add_vertex(&sample_vertex(i as f32)).unwrap();
        }
        let slot = store.add_triangle_indices([0, 1, 2], 3).unwrap();
        assert_eq!(store.face_indices(slot).unwrap(), [3, 4, 5]);

        let err = store.add_triangle_indices([0, 1, 3], 3).unwrap_err();
        assert!(matches!(err, BufferError::IndexOutOfBounds { index: 6, len: 6, .. }));
        assert_eq!(store.triangle_count(), 1);
    }

    #[test]
    fn reserve_keeps_existing_values() {
        let mut store = AttributeBufferStore::with_material(false, &[0]);
        let first = store.add_vertex_filled(&sample_vertex(3.0)).unwrap();
        let before = store.vertex(first).unwrap();
        store.reserve(100);
        assert!(store.capacity() >= 101);
        let ptr = store.buffer_bytes(AttributeKind::Position).unwrap().as_ptr();
        for k in 0..100 {
            store.add_vertex_filled(&sample_vertex(k as f32)).unwrap();
        }
        assert_eq!(
            store.buffer_bytes(AttributeKind::Position).unwrap().as_ptr(),
            ptr
        );
        assert_eq!(store.vertex(first).unwrap(), before);
    }

    #[test]
    fn append_store_shifts_indices() {
        let mut a = AttributeBufferStore::new();
        let mut b = AttributeBufferStore::new();
        for i in 0..3 {
            a.add_vertex(&sample_vertex(i as f32)).unwrap();
            b.add_vertex(&sample_vertex(10.0 + i as f32)).unwrap();
        }
        a.add_triangle_indices([0, 1, 2], 0).unwrap();
        b.add_triangle_indices([2, 1, 0], 0).unwrap();

        let shift = a.append_store(&b).unwrap();
        assert_eq!(shift, 3);
        assert_eq!(a.face_indices(1).unwrap(), [5, 4, 3]);
        assert_eq!(a.position(3).unwrap(), b.position(0).unwrap());
    }

    #[test]
    fn append_incompatible_store_fails() {
        let mut a = AttributeBufferStore::new();
        let b = AttributeBufferStore::with_material(false, &[2]);
        assert!(matches!(
            a.append_store(&b),
            Err(BufferError::IncompatibleAttributes { .. })
        ));
    }

    #[test]
    fn component_setters() {
        let mut store = AttributeBufferStore::with_material(false, &[1]);
        let i = store.add_vertex_filled(&sample_vertex(0.0)).unwrap();
        store.set_color_component(i, 3, 0.25).unwrap();
        assert_eq!(store.color(i).unwrap().w, 0.25);
        store.set_extra(i, 1, Vector4::new(1.0, 2.0, 3.0, 4.0)).unwrap();
        store.set_extra_xyz(i, 1, Vector3::new(7.0, 8.0, 9.0)).unwrap();
        store.set_extra_component(i, 1, 0, -1.0).unwrap();
        assert_eq!(store.extra(i, 1).unwrap(), Vector4::new(-1.0, 8.0, 9.0, 4.0));
        assert!(store.set_color_component(i, 4, 0.0).is_err());
    }

    #[test]
    fn with_attributes_validates() {
        assert!(AttributeBufferStore::with_attributes(AttributeSet::POSITION).is_err());
        let store =
            AttributeBufferStore::with_attributes(AttributeSet::standard().with_extra(4)).unwrap();
        assert!(store.has_extra(4));
        assert!(!store.has_material());
    }
}
