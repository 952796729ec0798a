//! In-place transforms and per-vertex deformations.

use mesh_buffers::{Matrix3, Point3, Vector3, VertexViewMut};
use tracing::debug;

use crate::aggregate::MeshAggregate;
use crate::error::{MeshError, MeshResult};
use crate::id::PolyGroupId;

impl MeshAggregate {
    /// Apply `p ↦ M p + v` to every vertex of a polygroup.
    ///
    /// Normals are mapped by the inverse transpose of `M` and renormalised.
    /// When `det M < 0` triangle winding is reversed so faces keep facing
    /// the way their vertex normals do.
    ///
    /// # Errors
    ///
    /// - [`MeshError::UnknownPolygroup`] if `id` does not exist;
    /// - [`MeshError::IllegalArgument`] if `M` is singular. Nothing is
    ///   modified in that case.
    pub fn affine_transform(
        &mut self,
        m: &Matrix3<f32>,
        v: &Vector3<f32>,
        id: &PolyGroupId,
    ) -> MeshResult<()> {
        let normal_map = normal_matrix(m)?;
        let vertices = self.group_vertices(id)?;
        for &i in &vertices {
            let p = self.store.position(i)?;
            self.store.set_position(i, Point3::from(m * p.coords + v))?;
            let n = normal_map * self.store.normal(i)?;
            self.store.set_normal(i, n.try_normalize(0.0).unwrap_or(n))?;
        }
        if m.determinant() < 0.0 {
            for t in self.group_triangles(id)? {
                self.store.triangle_view_mut(t)?.change_orientation();
            }
        }
        Ok(())
    }

    /// [`affine_transform`](Self::affine_transform) on every polygroup.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::IllegalArgument`] if `M` is singular.
    pub fn affine_transform_all(&mut self, m: &Matrix3<f32>, v: &Vector3<f32>) -> MeshResult<()> {
        normal_matrix(m)?;
        for id in self.ids() {
            self.affine_transform(m, v, &id)?;
        }
        Ok(())
    }

    /// Translate a polygroup.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist.
    pub fn shift(&mut self, v: &Vector3<f32>, id: &PolyGroupId) -> MeshResult<()> {
        for i in self.group_vertices(id)? {
            let p = self.store.position(i)?;
            self.store.set_position(i, p + v)?;
        }
        Ok(())
    }

    /// Translate every polygroup.
    ///
    /// # Errors
    ///
    /// Propagates buffer errors.
    pub fn shift_all(&mut self, v: &Vector3<f32>) -> MeshResult<()> {
        for id in self.ids() {
            self.shift(v, &id)?;
        }
        Ok(())
    }

    /// Scale a polygroup about the origin.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::IllegalArgument`] if `factor` is zero.
    pub fn scale(&mut self, factor: f32, id: &PolyGroupId) -> MeshResult<()> {
        self.affine_transform(&(Matrix3::identity() * factor), &Vector3::zeros(), id)
    }

    /// Scale every polygroup about the origin.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::IllegalArgument`] if `factor` is zero.
    pub fn scale_all(&mut self, factor: f32) -> MeshResult<()> {
        self.affine_transform_all(&(Matrix3::identity() * factor), &Vector3::zeros())
    }

    /// Run `f` on a mutable view of every vertex of a polygroup.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist.
    pub fn deform_per_vertex<F>(&mut self, id: &PolyGroupId, mut f: F) -> MeshResult<()>
    where
        F: FnMut(&mut VertexViewMut<'_>),
    {
        for i in self.group_vertices(id)? {
            f(&mut self.store.vertex_view_mut(i)?);
        }
        Ok(())
    }

    /// [`deform_per_vertex`](Self::deform_per_vertex) over every polygroup.
    ///
    /// # Errors
    ///
    /// Propagates buffer errors.
    pub fn deform_all_per_vertex<F>(&mut self, mut f: F) -> MeshResult<()>
    where
        F: FnMut(&mut VertexViewMut<'_>),
    {
        for id in self.ids() {
            self.deform_per_vertex(&id, &mut f)?;
        }
        Ok(())
    }

    /// Like [`deform_per_vertex`](Self::deform_per_vertex), with the local
    /// index passed alongside each view.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist.
    pub fn deform_per_vertex_indexed<F>(&mut self, id: &PolyGroupId, mut f: F) -> MeshResult<()>
    where
        F: FnMut(usize, &mut VertexViewMut<'_>),
    {
        for (local, i) in self.group_vertices(id)?.into_iter().enumerate() {
            f(local, &mut self.store.vertex_view_mut(i)?);
        }
        Ok(())
    }

    /// Run `f` on every vertex of every polygroup, passing the owning id.
    ///
    /// # Errors
    ///
    /// Propagates buffer errors.
    pub fn deform_per_id<F>(&mut self, mut f: F) -> MeshResult<()>
    where
        F: FnMut(&mut VertexViewMut<'_>, &PolyGroupId),
    {
        for id in self.ids() {
            for i in self.group_vertices(&id)? {
                f(&mut self.store.vertex_view_mut(i)?, &id);
            }
        }
        Ok(())
    }

    /// Move every vertex by `delta · field(p)`.
    ///
    /// Normals are left as they are.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist.
    pub fn move_along_vector_field<F>(&mut self, id: &PolyGroupId, field: F, delta: f32) -> MeshResult<()>
    where
        F: Fn(Point3<f32>) -> Vector3<f32>,
    {
        self.deform_per_vertex(id, |v| v.translate(field(v.position()) * delta))
    }

    /// Map every vertex position through `f`, then recompute the group's normals.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist.
    pub fn deform_with_ambient_map<F>(&mut self, id: &PolyGroupId, f: F) -> MeshResult<()>
    where
        F: Fn(Point3<f32>) -> Point3<f32>,
    {
        self.deform_per_vertex(id, |v| v.apply(&f))?;
        self.recalculate_normals(id)
    }

    /// [`deform_with_ambient_map`](Self::deform_with_ambient_map) on every polygroup.
    ///
    /// # Errors
    ///
    /// Propagates buffer errors.
    pub fn deform_all_with_ambient_map<F>(&mut self, f: F) -> MeshResult<()>
    where
        F: Fn(Point3<f32>) -> Point3<f32>,
    {
        let ids = self.ids();
        debug!("Ambient map over {} polygroups", ids.len());
        for id in ids {
            self.deform_with_ambient_map(&id, &f)?;
        }
        Ok(())
    }

    /// Bind a time-dependent per-vertex deformation to one polygroup.
    ///
    /// The returned operator borrows the aggregate and, called with
    /// `(t, dt)`, runs `deformation(vertex, t, dt)` on every vertex of `id`.
    /// It suits animation loops that advance a clock and hand it on.
    ///
    /// ```
    /// use mesh_polygroup::{MeshAggregate, PolyGroupId};
    /// use mesh_buffers::{Vector3, Vertex};
    ///
    /// let id = PolyGroupId::from(0);
    /// let vertices: Vec<Vertex> = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
    ///     .into_iter()
    ///     .map(Vertex::from)
    ///     .collect();
    /// let mut mesh = MeshAggregate::from_polygroup(&vertices, &[[0, 1, 2]], id.clone())?;
    ///
    /// let mut rise = mesh.deformation_operator(&id, |v, _t, dt| v.translate(Vector3::z() * dt));
    /// for step in 0..4 {
    ///     rise(step as f32 * 0.25, 0.25)?;
    /// }
    /// drop(rise);
    /// assert!((mesh.vertex_view(&id, 1)?.position().z - 1.0).abs() < 1e-6);
    /// # Ok::<(), mesh_polygroup::MeshError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// The operator returns [`MeshError::UnknownPolygroup`] if `id` does not
    /// exist.
    pub fn deformation_operator<'a, F>(
        &'a mut self,
        id: &'a PolyGroupId,
        mut deformation: F,
    ) -> impl FnMut(f32, f32) -> MeshResult<()> + 'a
    where
        F: FnMut(&mut VertexViewMut<'_>, f32, f32) + 'a,
    {
        move |t, dt| self.deform_per_vertex(id, |v| deformation(v, t, dt))
    }

    /// One-parameter variant of
    /// [`deformation_operator`](Self::deformation_operator): the operator
    /// takes only `t`.
    ///
    /// # Errors
    ///
    /// The operator returns [`MeshError::UnknownPolygroup`] if `id` does not
    /// exist.
    pub fn time_deformation_operator<'a, F>(
        &'a mut self,
        id: &'a PolyGroupId,
        mut deformation: F,
    ) -> impl FnMut(f32) -> MeshResult<()> + 'a
    where
        F: FnMut(&mut VertexViewMut<'_>, f32) + 'a,
    {
        move |t| self.deform_per_vertex(id, |v| deformation(v, t))
    }

    /// An operator that carries a polygroup along `curve`.
    ///
    /// Called with `(t, dt)` it translates the group by
    /// `curve(t) - curve(t - dt)`, so stepping `t` by `dt` from the curve's
    /// start keeps the group's offset from the curve point fixed.
    ///
    /// # Errors
    ///
    /// The operator returns [`MeshError::UnknownPolygroup`] if `id` does not
    /// exist.
    pub fn move_along_curve<'a, C>(
        &'a mut self,
        curve: C,
        id: &'a PolyGroupId,
    ) -> impl FnMut(f32, f32) -> MeshResult<()> + 'a
    where
        C: Fn(f32) -> Point3<f32> + 'a,
    {
        move |t, dt| {
            let delta = curve(t) - curve(t - dt);
            self.shift(&delta, id)
        }
    }
}

fn normal_matrix(m: &Matrix3<f32>) -> MeshResult<Matrix3<f32>> {
    m.try_inverse()
        .map(|inv| inv.transpose())
        .ok_or_else(|| MeshError::IllegalArgument(format!("singular transform matrix {m}")))
}
