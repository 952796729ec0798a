//! The polygroup mesh aggregate.

use std::collections::BTreeMap;

use mesh_buffers::{
    AttributeBufferStore, AttributeKind, AttributeSet, BufferError, BufferResult, Matrix4, Point3,
    RenderBinding, TriangleView, Vertex, VertexView, VertexViewMut, EXTRA_SLOTS,
};
use tracing::{debug, info};

use crate::error::{MeshError, MeshResult};
use crate::id::PolyGroupId;

/// Index lists of one polygroup.
///
/// Only store indices are kept here; the attribute data lives in the
/// aggregate's single [`AttributeBufferStore`]. The position of an entry in
/// [`vertices`](Self::vertices) is its **local index**.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Polygroup {
    pub(crate) vertices: Vec<u32>,
    pub(crate) triangles: Vec<u32>,
}

impl Polygroup {
    /// Store indices of the group's vertices, in local order.
    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[u32] {
        &self.vertices
    }

    /// Store slots of the group's triangles, in local order.
    #[inline]
    #[must_use]
    pub fn triangles(&self) -> &[u32] {
        &self.triangles
    }

    /// Number of vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Check if the group has neither vertices nor triangles.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.triangles.is_empty()
    }

    fn shifted(&self, shift: u32) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| v + shift).collect(),
            triangles: self.triangles.iter().map(|t| t + shift).collect(),
        }
    }

    fn append(&mut self, other: Self) {
        self.vertices.extend(other.vertices);
        self.triangles.extend(other.triangles);
    }
}

/// A triangle mesh partitioned into polygroups over one shared store.
///
/// Every triangle of a group references only vertices of the same group.
/// Groups are created by [`add_new_polygroup`](Self::add_new_polygroup),
/// [`copy_polygroup`](Self::copy_polygroup) and [`merge`](Self::merge);
/// there is no removal API.
///
/// `Clone` is a deep copy. `std::mem::take` moves the contents out and
/// leaves an empty, valid aggregate behind.
///
/// # Example
///
/// ```
/// use mesh_polygroup::{MeshAggregate, PolyGroupId};
/// use mesh_buffers::Vertex;
///
/// let vertices: Vec<Vertex> = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
///     .into_iter()
///     .map(Vertex::from)
///     .collect();
///
/// let mut mesh = MeshAggregate::new();
/// mesh.add_new_polygroup(&vertices, &[[0, 1, 2]], PolyGroupId::from(1))?;
///
/// assert_eq!(mesh.triangle_count(&PolyGroupId::from(1))?, 1);
/// assert!((mesh.surface_area(&PolyGroupId::from(1))? - 0.5).abs() < 1e-6);
/// # Ok::<(), mesh_polygroup::MeshError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MeshAggregate {
    pub(crate) store: AttributeBufferStore,
    pub(crate) groups: BTreeMap<PolyGroupId, Polygroup>,
}

impl MeshAggregate {
    /// Create an empty aggregate with the standard attribute set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty aggregate with an explicit attribute set.
    ///
    /// # Errors
    ///
    /// Returns an error if the set is not a valid store layout.
    pub fn with_attributes(attributes: AttributeSet) -> MeshResult<Self> {
        Ok(Self {
            store: AttributeBufferStore::with_attributes(attributes)?,
            groups: BTreeMap::new(),
        })
    }

    /// Create an empty aggregate with optional material columns and extra slots.
    #[must_use]
    pub fn with_material(material: bool, extra_slots: &[usize]) -> Self {
        Self {
            store: AttributeBufferStore::with_material(material, extra_slots),
            groups: BTreeMap::new(),
        }
    }

    /// Create an aggregate holding a single polygroup.
    ///
    /// The attribute set is taken from the first vertex: material columns
    /// and extra slots are active when that record carries them.
    ///
    /// # Errors
    ///
    /// Same as [`add_new_polygroup_strict`](Self::add_new_polygroup_strict).
    pub fn from_polygroup(
        vertices: &[Vertex],
        faces: &[[u32; 3]],
        id: PolyGroupId,
    ) -> MeshResult<Self> {
        let mut attributes = AttributeSet::standard();
        if let Some(first) = vertices.first() {
            if first.attributes.material.is_some() {
                attributes = attributes.with_material();
            }
            for slot in 0..EXTRA_SLOTS {
                if first.attributes.extras[slot].is_some() {
                    attributes = attributes.with_extra(slot);
                }
            }
        }
        let mut mesh = Self::with_attributes(attributes)?;
        mesh.add_new_polygroup_strict(vertices, faces, id)?;
        Ok(mesh)
    }

    // ---------------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------------

    /// Append a polygroup from a vertex list and locally numbered faces.
    ///
    /// Face indices refer to positions in `vertices`. Everything is checked
    /// before the store is touched, so a failed call leaves the aggregate
    /// unchanged. Active slots a record leaves unset are filled with zeros.
    /// Reusing an existing id appends to that group.
    ///
    /// # Errors
    ///
    /// - [`MeshError::FaceIndexOutOfBounds`] if a face index is not below
    ///   `vertices.len()`;
    /// - [`MeshError::Buffer`] if a record carries a slot the store lacks.
    pub fn add_new_polygroup(
        &mut self,
        vertices: &[Vertex],
        faces: &[[u32; 3]],
        id: PolyGroupId,
    ) -> MeshResult<()> {
        self.append_group(vertices, faces, id, false)
    }

    /// Like [`add_new_polygroup`](Self::add_new_polygroup), but every record
    /// must carry exactly the store's optional slots.
    ///
    /// # Errors
    ///
    /// As for [`add_new_polygroup`](Self::add_new_polygroup), plus
    /// [`MeshError::Buffer`] for records missing an active slot.
    pub fn add_new_polygroup_strict(
        &mut self,
        vertices: &[Vertex],
        faces: &[[u32; 3]],
        id: PolyGroupId,
    ) -> MeshResult<()> {
        self.append_group(vertices, faces, id, true)
    }

    fn append_group(
        &mut self,
        vertices: &[Vertex],
        faces: &[[u32; 3]],
        id: PolyGroupId,
        strict: bool,
    ) -> MeshResult<()> {
        for (face, indices) in faces.iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
                return Err(MeshError::FaceIndexOutOfBounds {
                    face,
                    index,
                    vertex_count: vertices.len(),
                });
            }
        }
        for vertex in vertices {
            self.store.check_vertex(vertex, strict)?;
        }
        let shift = self.store.index_shift()?;
        if u32::try_from(self.store.vertex_count() + vertices.len()).is_err() {
            return Err(MeshError::IllegalArgument(
                "vertex count would exceed the u32 index range".into(),
            ));
        }

        self.store.reserve(vertices.len());
        self.store.reserve_triangles(faces.len());

        let mut group = Polygroup::default();
        for vertex in vertices {
            let index = self.store.add_vertex_filled(vertex)?;
            group.vertices.push(to_u32(index)?);
        }
        for face in faces {
            let slot = self.store.add_triangle_indices(*face, shift)?;
            group.triangles.push(to_u32(slot)?);
        }

        debug!(
            "Added {} vertices and {} triangles to polygroup {}",
            vertices.len(),
            faces.len(),
            id
        );
        self.groups.entry(id).or_default().append(group);
        Ok(())
    }

    /// Duplicate a polygroup's data under a new id.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist.
    pub fn copy_polygroup(&mut self, id: &PolyGroupId, new_id: PolyGroupId) -> MeshResult<()> {
        let vertices = self.vertices(id)?;
        let faces = self.indices(id)?;
        self.add_new_polygroup_strict(&vertices, &faces, new_id)
    }

    /// Copy a polygroup of another aggregate into this one.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `other` lacks `id`, and a
    /// buffer error if the records do not fit this aggregate's store.
    pub fn copy_polygroup_from(
        &mut self,
        other: &Self,
        id: &PolyGroupId,
        new_id: PolyGroupId,
    ) -> MeshResult<()> {
        let vertices = other.vertices(id)?;
        let faces = other.indices(id)?;
        self.add_new_polygroup(&vertices, &faces, new_id)
    }

    /// Union all polygroups of `other` into this aggregate.
    ///
    /// `other`'s store is appended to this one and its indices re-shifted.
    /// Groups whose id already exists here are concatenated.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IncompatibleAttributes`](mesh_buffers::BufferError::IncompatibleAttributes)
    /// (wrapped) when the two stores carry different attribute sets.
    pub fn merge(&mut self, other: &Self) -> MeshResult<()> {
        let shift = self.store.append_store(&other.store)?;
        for (id, group) in &other.groups {
            self.groups
                .entry(id.clone())
                .or_default()
                .append(group.shifted(shift));
        }
        info!(
            "Merged {} polygroups ({} vertices)",
            other.groups.len(),
            other.store.vertex_count()
        );
        Ok(())
    }

    /// Like [`merge`](Self::merge), but colliding ids of `other` are renamed
    /// with [`PolyGroupId::make_unique`] so every group stays distinct.
    ///
    /// Returns the ids the colliding groups were stored under.
    ///
    /// # Errors
    ///
    /// Same as [`merge`](Self::merge).
    pub fn merge_and_keep_id(&mut self, other: &Self) -> MeshResult<Vec<(PolyGroupId, PolyGroupId)>> {
        let shift = self.store.append_store(&other.store)?;
        let mut renamed = Vec::new();
        for (id, group) in &other.groups {
            let mut target = id.clone();
            while self.groups.contains_key(&target) || (target != *id && other.groups.contains_key(&target)) {
                target = id.make_unique();
            }
            if target != *id {
                renamed.push((id.clone(), target.clone()));
            }
            self.groups.insert(target, group.shifted(shift));
        }
        info!(
            "Merged {} polygroups, {} renamed",
            other.groups.len(),
            renamed.len()
        );
        Ok(renamed)
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    /// The underlying attribute store.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &AttributeBufferStore {
        &self.store
    }

    /// The active attribute set.
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> AttributeSet {
        self.store.attributes()
    }

    /// Polygroup ids in ascending order.
    pub fn polygroup_ids(&self) -> impl Iterator<Item = &PolyGroupId> {
        self.groups.keys()
    }

    /// Check whether a polygroup exists.
    #[must_use]
    pub fn contains_polygroup(&self, id: &PolyGroupId) -> bool {
        self.groups.contains_key(id)
    }

    /// Number of polygroups.
    #[must_use]
    pub fn polygroup_count(&self) -> usize {
        self.groups.len()
    }

    /// Check if the aggregate has no polygroups.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Index lists of one polygroup.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist.
    pub fn polygroup(&self, id: &PolyGroupId) -> MeshResult<&Polygroup> {
        self.groups
            .get(id)
            .ok_or_else(|| MeshError::UnknownPolygroup(id.clone()))
    }

    /// Number of vertices in a polygroup.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist.
    pub fn vertex_count(&self, id: &PolyGroupId) -> MeshResult<usize> {
        Ok(self.polygroup(id)?.vertex_count())
    }

    /// Number of triangles in a polygroup.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist.
    pub fn triangle_count(&self, id: &PolyGroupId) -> MeshResult<usize> {
        Ok(self.polygroup(id)?.triangle_count())
    }

    /// Total number of vertices over all groups.
    #[must_use]
    pub fn total_vertex_count(&self) -> usize {
        self.store.vertex_count()
    }

    /// Total number of triangles over all groups.
    #[must_use]
    pub fn total_triangle_count(&self) -> usize {
        self.store.triangle_count()
    }

    /// Owned copies of a polygroup's vertices, in local order.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist.
    pub fn vertices(&self, id: &PolyGroupId) -> MeshResult<Vec<Vertex>> {
        self.polygroup(id)?
            .vertices
            .iter()
            .map(|&v| self.store.vertex(v as usize).map_err(MeshError::from))
            .collect()
    }

    /// Triangle corners of a polygroup as local vertex indices.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist.
    pub fn indices(&self, id: &PolyGroupId) -> MeshResult<Vec<[u32; 3]>> {
        let group = self.polygroup(id)?;
        let local = crate::topology::local_lookup(group);
        group
            .triangles
            .iter()
            .map(|&t| -> MeshResult<[u32; 3]> {
                let face = self.store.face_indices(t as usize)?;
                let mut out = [0u32; 3];
                for (slot, v) in out.iter_mut().zip(face) {
                    let l = local.get(&v).copied().ok_or_else(|| {
                        MeshError::IllegalArgument(format!(
                            "triangle {t} of polygroup {id} uses vertex {v} outside the group"
                        ))
                    })?;
                    *slot = to_u32(l)?;
                }
                Ok(out)
            })
            .collect()
    }

    /// Store index of a group-local vertex.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] or
    /// [`MeshError::LocalIndexOutOfBounds`].
    pub fn global_vertex_index(&self, id: &PolyGroupId, local: usize) -> MeshResult<usize> {
        let group = self.polygroup(id)?;
        group
            .vertices
            .get(local)
            .map(|&v| v as usize)
            .ok_or_else(|| MeshError::LocalIndexOutOfBounds {
                id: id.clone(),
                index: local,
                len: group.vertices.len(),
            })
    }

    /// Store slot of a group-local triangle.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] or
    /// [`MeshError::LocalIndexOutOfBounds`].
    pub fn global_triangle_slot(&self, id: &PolyGroupId, local: usize) -> MeshResult<usize> {
        let group = self.polygroup(id)?;
        group
            .triangles
            .get(local)
            .map(|&t| t as usize)
            .ok_or_else(|| MeshError::LocalIndexOutOfBounds {
                id: id.clone(),
                index: local,
                len: group.triangles.len(),
            })
    }

    /// View of a group-local vertex.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] or
    /// [`MeshError::LocalIndexOutOfBounds`].
    pub fn vertex_view(&self, id: &PolyGroupId, local: usize) -> MeshResult<VertexView<'_>> {
        let index = self.global_vertex_index(id, local)?;
        Ok(self.store.vertex_view(index)?)
    }

    /// Mutable view of a group-local vertex.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] or
    /// [`MeshError::LocalIndexOutOfBounds`].
    pub fn vertex_view_mut(&mut self, id: &PolyGroupId, local: usize) -> MeshResult<VertexViewMut<'_>> {
        let index = self.global_vertex_index(id, local)?;
        Ok(self.store.vertex_view_mut(index)?)
    }

    /// View of a group-local triangle.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] or
    /// [`MeshError::LocalIndexOutOfBounds`].
    pub fn triangle_view(&self, id: &PolyGroupId, local: usize) -> MeshResult<TriangleView<'_>> {
        let slot = self.global_triangle_slot(id, local)?;
        Ok(self.store.triangle_view(slot)?)
    }

    /// Views of a polygroup's vertices, in local order.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist.
    pub fn vertex_views(&self, id: &PolyGroupId) -> MeshResult<Vec<VertexView<'_>>> {
        self.polygroup(id)?
            .vertices
            .iter()
            .map(|&v| self.store.vertex_view(v as usize).map_err(MeshError::from))
            .collect()
    }

    /// Views of a polygroup's triangles, in local order.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist.
    pub fn triangle_views(&self, id: &PolyGroupId) -> MeshResult<Vec<TriangleView<'_>>> {
        self.polygroup(id)?
            .triangles
            .iter()
            .map(|&t| self.store.triangle_view(t as usize).map_err(MeshError::from))
            .collect()
    }

    /// Some vertex of a polygroup, for reading group-wide data such as a
    /// shared material.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist and
    /// [`MeshError::EmptyPolygroup`] if it has no vertices.
    pub fn any_vertex(&self, id: &PolyGroupId) -> MeshResult<VertexView<'_>> {
        let &first = self
            .polygroup(id)?
            .vertices
            .first()
            .ok_or_else(|| MeshError::EmptyPolygroup(id.clone()))?;
        Ok(self.store.vertex_view(first as usize)?)
    }

    /// Mutable counterpart of [`any_vertex`](Self::any_vertex).
    ///
    /// # Errors
    ///
    /// Same as [`any_vertex`](Self::any_vertex).
    pub fn any_vertex_mut(&mut self, id: &PolyGroupId) -> MeshResult<VertexViewMut<'_>> {
        let &first = self
            .polygroup(id)?
            .vertices
            .first()
            .ok_or_else(|| MeshError::EmptyPolygroup(id.clone()))?;
        Ok(self.store.vertex_view_mut(first as usize)?)
    }

    // ---------------------------------------------------------------------
    // Materials
    // ---------------------------------------------------------------------

    /// Give every vertex of every polygroup the same material.
    ///
    /// # Errors
    ///
    /// Returns a wrapped [`BufferError::NotImplemented`](mesh_buffers::BufferError::NotImplemented)
    /// when the store has no material columns, even if it holds no vertices.
    pub fn set_global_material(&mut self, material: &Matrix4<f32>) -> MeshResult<()> {
        if !self.store.has_material() {
            return Err(BufferError::NotImplemented {
                operation: "set_global_material",
                kind: AttributeKind::Material1,
            }
            .into());
        }
        for i in 0..self.store.vertex_count() {
            self.store.set_material(i, *material)?;
        }
        debug!("Set a global material on {} vertices", self.store.vertex_count());
        Ok(())
    }

    /// Give every vertex of one polygroup the same material.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist, and a
    /// wrapped [`BufferError::NotImplemented`](mesh_buffers::BufferError::NotImplemented)
    /// without material columns.
    pub fn set_polygroup_material(&mut self, material: &Matrix4<f32>, id: &PolyGroupId) -> MeshResult<()> {
        let vertices = self.group_vertices(id)?;
        if !self.store.has_material() {
            return Err(BufferError::NotImplemented {
                operation: "set_polygroup_material",
                kind: AttributeKind::Material1,
            }
            .into());
        }
        for i in vertices {
            self.store.set_material(i, *material)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Render export
    // ---------------------------------------------------------------------

    /// One binding per active kind plus the index binding.
    #[must_use]
    pub fn render_bindings(&self) -> Vec<RenderBinding<'_>> {
        self.store.render_bindings()
    }

    /// Raw bytes of one buffer.
    ///
    /// # Errors
    ///
    /// Returns `NotImplemented` for an inactive kind.
    pub fn buffer_bytes(&self, kind: AttributeKind) -> BufferResult<&[u8]> {
        self.store.buffer_bytes(kind)
    }

    /// Element count of one buffer.
    #[must_use]
    pub fn buffer_length(&self, kind: AttributeKind) -> usize {
        self.store.buffer_length(kind)
    }

    /// Byte size of one buffer.
    #[must_use]
    pub fn buffer_size(&self, kind: AttributeKind) -> usize {
        self.store.buffer_size(kind)
    }

    /// Index buffer as raw bytes.
    #[must_use]
    pub fn index_bytes(&self) -> &[u8] {
        self.store.index_bytes()
    }

    /// Reserve room for `additional` more vertices.
    pub fn reserve(&mut self, additional: usize) {
        self.store.reserve(additional);
    }

    // ---------------------------------------------------------------------
    // Scope helpers
    // ---------------------------------------------------------------------

    /// Store indices of a group's vertices, cloned out so the store can be
    /// mutated while iterating.
    pub(crate) fn group_vertices(&self, id: &PolyGroupId) -> MeshResult<Vec<usize>> {
        Ok(self
            .polygroup(id)?
            .vertices
            .iter()
            .map(|&v| v as usize)
            .collect())
    }

    pub(crate) fn group_triangles(&self, id: &PolyGroupId) -> MeshResult<Vec<usize>> {
        Ok(self
            .polygroup(id)?
            .triangles
            .iter()
            .map(|&t| t as usize)
            .collect())
    }

    /// Current positions of a group's vertices, in local order.
    pub(crate) fn group_positions(&self, id: &PolyGroupId) -> MeshResult<Vec<Point3<f32>>> {
        self.polygroup(id)?
            .vertices
            .iter()
            .map(|&v| self.store.position(v as usize).map_err(MeshError::from))
            .collect()
    }

    /// Ids of every group, cloned.
    pub(crate) fn ids(&self) -> Vec<PolyGroupId> {
        self.groups.keys().cloned().collect()
    }
}

pub(crate) fn to_u32(n: usize) -> MeshResult<u32> {
    u32::try_from(n)
        .map_err(|_| MeshError::IllegalArgument(format!("index {n} exceeds the u32 index range")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use mesh_buffers::Vector4;

    fn triangle_vertices(offset: f32) -> Vec<Vertex> {
        [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
            .into_iter()
            .map(|[x, y, z]| Vertex::from_coords(x + offset, y, z))
            .collect()
    }

    fn id(n: i32) -> PolyGroupId {
        PolyGroupId::from(n)
    }

    #[test]
    fn add_new_polygroup_records_views() {
        let mut mesh = MeshAggregate::new();
        mesh.add_new_polygroup(&triangle_vertices(0.0), &[[0, 1, 2]], id(1))
            .unwrap();
        mesh.add_new_polygroup(&triangle_vertices(5.0), &[[0, 2, 1]], id(2))
            .unwrap();

        assert_eq!(mesh.polygroup_count(), 2);
        assert_eq!(mesh.total_vertex_count(), 6);
        assert_eq!(mesh.polygroup(&id(2)).unwrap().vertices(), &[3, 4, 5]);
        assert_eq!(mesh.store().face_indices(1).unwrap(), [3, 5, 4]);
        assert_eq!(mesh.indices(&id(2)).unwrap(), vec![[0, 2, 1]]);
        assert_eq!(
            mesh.vertex_view(&id(2), 0).unwrap().position(),
            Point3::new(5.0, 0.0, 0.0)
        );
    }

    #[test]
    fn bad_face_index_leaves_mesh_untouched() {
        let mut mesh = MeshAggregate::new();
        let err = mesh
            .add_new_polygroup(&triangle_vertices(0.0), &[[0, 1, 2], [0, 1, 3]], id(1))
            .unwrap_err();
        assert_eq!(
            err,
            MeshError::FaceIndexOutOfBounds {
                face: 1,
                index: 3,
                vertex_count: 3
            }
        );
        assert!(mesh.is_empty());
        assert_eq!(mesh.total_vertex_count(), 0);
    }

    #[test]
    fn unsupported_record_leaves_mesh_untouched() {
        let mut mesh = MeshAggregate::new();
        let mut vertices = triangle_vertices(0.0);
        vertices[2] = vertices[2].clone().with_extra(0, Vector4::x());
        assert!(mesh.add_new_polygroup(&vertices, &[[0, 1, 2]], id(1)).is_err());
        assert_eq!(mesh.total_vertex_count(), 0);
    }

    #[test]
    fn reused_id_appends() {
        let mut mesh = MeshAggregate::new();
        mesh.add_new_polygroup(&triangle_vertices(0.0), &[[0, 1, 2]], id(1))
            .unwrap();
        mesh.add_new_polygroup(&triangle_vertices(2.0), &[[0, 1, 2]], id(1))
            .unwrap();
        assert_eq!(mesh.vertex_count(&id(1)).unwrap(), 6);
        assert_eq!(mesh.indices(&id(1)).unwrap(), vec![[0, 1, 2], [3, 4, 5]]);
    }

    #[test]
    fn from_polygroup_infers_attributes() {
        let vertices: Vec<Vertex> = triangle_vertices(0.0)
            .into_iter()
            .map(|v| v.with_extra(1, Vector4::zeros()))
            .collect();
        let mesh = MeshAggregate::from_polygroup(&vertices, &[[0, 1, 2]], id(0)).unwrap();
        assert!(mesh.store().has_extra(1));
        assert!(!mesh.store().has_material());
    }

    #[test]
    fn merge_disjoint_ids() {
        let a = MeshAggregate::from_polygroup(&triangle_vertices(0.0), &[[0, 1, 2]], id(1)).unwrap();
        let b = MeshAggregate::from_polygroup(&triangle_vertices(3.0), &[[0, 2, 1]], id(2)).unwrap();

        let mut merged = a.clone();
        merged.merge(&b).unwrap();
        let ids: Vec<_> = merged.polygroup_ids().cloned().collect();
        assert_eq!(ids, vec![id(1), id(2)]);
        assert_eq!(merged.indices(&id(2)).unwrap(), b.indices(&id(2)).unwrap());
        assert_eq!(merged.vertices(&id(2)).unwrap(), b.vertices(&id(2)).unwrap());
        assert_eq!(merged.vertices(&id(1)).unwrap(), a.vertices(&id(1)).unwrap());
    }

    #[test]
    fn merge_colliding_ids_concatenates() {
        let mut a = MeshAggregate::from_polygroup(&triangle_vertices(0.0), &[[0, 1, 2]], id(1)).unwrap();
        let b = a.clone();
        a.merge(&b).unwrap();
        assert_eq!(a.polygroup_count(), 1);
        assert_eq!(a.triangle_count(&id(1)).unwrap(), 2);
    }

    #[test]
    fn merge_and_keep_id_renames() {
        let mut a = MeshAggregate::from_polygroup(&triangle_vertices(0.0), &[[0, 1, 2]], id(1)).unwrap();
        let b = a.clone();
        let renamed = a.merge_and_keep_id(&b).unwrap();
        assert_eq!(a.polygroup_count(), 2);
        assert_eq!(renamed.len(), 1);
        assert_eq!(renamed[0].0, id(1));
        assert_eq!(a.triangle_count(&renamed[0].1).unwrap(), 1);
    }

    #[test]
    fn merge_incompatible_fails() {
        let mut a = MeshAggregate::new();
        let b = MeshAggregate::with_material(true, &[]);
        assert!(matches!(
            a.merge(&b),
            Err(MeshError::Buffer(BufferError::IncompatibleAttributes { .. }))
        ));
    }

    #[test]
    fn copy_polygroup_duplicates_data() {
        let mut mesh = MeshAggregate::from_polygroup(&triangle_vertices(0.0), &[[0, 1, 2]], id(1)).unwrap();
        mesh.copy_polygroup(&id(1), id(7)).unwrap();
        mesh.vertex_view_mut(&id(7), 0)
            .unwrap()
            .set_position(Point3::new(9.0, 9.0, 9.0));
        assert_eq!(
            mesh.vertex_view(&id(1), 0).unwrap().position(),
            Point3::origin()
        );
        assert_eq!(mesh.indices(&id(7)).unwrap(), mesh.indices(&id(1)).unwrap());

        let mut other = MeshAggregate::new();
        other.copy_polygroup_from(&mesh, &id(7), id(0)).unwrap();
        assert_eq!(
            other.vertex_view(&id(0), 0).unwrap().position(),
            Point3::new(9.0, 9.0, 9.0)
        );
    }

    #[test]
    fn take_leaves_empty_aggregate() {
        let mut mesh = MeshAggregate::from_polygroup(&triangle_vertices(0.0), &[[0, 1, 2]], id(1)).unwrap();
        let moved = std::mem::take(&mut mesh);
        assert!(mesh.is_empty());
        assert_eq!(mesh.total_vertex_count(), 0);
        assert_eq!(moved.total_triangle_count(), 1);
    }

    #[test]
    fn unknown_and_local_bounds() {
        let mesh = MeshAggregate::from_polygroup(&triangle_vertices(0.0), &[[0, 1, 2]], id(1)).unwrap();
        assert!(matches!(
            mesh.vertex_count(&id(3)),
            Err(MeshError::UnknownPolygroup(_))
        ));
        assert!(matches!(
            mesh.vertex_view(&id(1), 3),
            Err(MeshError::LocalIndexOutOfBounds { index: 3, len: 3, .. })
        ));
    }

    #[test]
    fn any_vertex_is_the_first_local_vertex() {
        let mut mesh = MeshAggregate::from_polygroup(&triangle_vertices(2.0), &[[0, 1, 2]], id(1)).unwrap();
        assert_eq!(
            mesh.any_vertex(&id(1)).unwrap().position(),
            Point3::new(2.0, 0.0, 0.0)
        );
        mesh.any_vertex_mut(&id(1))
            .unwrap()
            .set_position(Point3::new(0.0, 0.0, 4.0));
        assert_eq!(
            mesh.vertex_view(&id(1), 0).unwrap().position(),
            Point3::new(0.0, 0.0, 4.0)
        );

        mesh.add_new_polygroup(&[], &[], id(2)).unwrap();
        assert_eq!(mesh.any_vertex(&id(2)).unwrap_err(), MeshError::EmptyPolygroup(id(2)));
        assert!(matches!(
            mesh.any_vertex(&id(5)),
            Err(MeshError::UnknownPolygroup(_))
        ));
    }

    #[test]
    fn global_material_reaches_every_group() {
        let mut mesh = MeshAggregate::with_material(true, &[]);
        mesh.add_new_polygroup(&triangle_vertices(0.0), &[[0, 1, 2]], id(1))
            .unwrap();
        mesh.add_new_polygroup(&triangle_vertices(3.0), &[[0, 1, 2]], id(2))
            .unwrap();
        let phong = Matrix4::from_diagonal(&Vector4::new(0.1, 0.6, 0.3, 32.0));
        mesh.set_global_material(&phong).unwrap();
        for group in [id(1), id(2)] {
            for v in mesh.vertex_views(&group).unwrap() {
                assert_eq!(v.material().unwrap(), phong);
            }
        }

        let shiny = Matrix4::identity() * 2.0;
        mesh.set_polygroup_material(&shiny, &id(2)).unwrap();
        assert_eq!(mesh.any_vertex(&id(1)).unwrap().material().unwrap(), phong);
        assert_eq!(mesh.any_vertex(&id(2)).unwrap().material().unwrap(), shiny);
    }

    #[test]
    fn global_material_needs_material_columns() {
        let mut mesh = MeshAggregate::new();
        assert!(matches!(
            mesh.set_global_material(&Matrix4::identity()),
            Err(MeshError::Buffer(BufferError::NotImplemented {
                kind: AttributeKind::Material1,
                ..
            }))
        ));
        mesh.add_new_polygroup(&triangle_vertices(0.0), &[[0, 1, 2]], id(1))
            .unwrap();
        assert!(matches!(
            mesh.set_polygroup_material(&Matrix4::identity(), &id(1)),
            Err(MeshError::Buffer(BufferError::NotImplemented { .. }))
        ));
    }
}
