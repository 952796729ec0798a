//! Discrete curvature estimators and mean curvature flow.
//!
//! The mean curvature vector uses cotangent weights over the 1-ring,
//!
//! ```text
//! K(i) = 1 / (4A) * Σ_j (cot α_ij + cot β_ij) (p_j - p_i)
//! ```
//!
//! where `α_ij`, `β_ij` are the angles opposite edge `ij` and `A` is one
//! third of the incident triangle area. `K(i)` points towards the centre of
//! curvature and its length approximates the mean curvature `H`; on a unit
//! sphere it is close to 1.
//!
//! Gauss curvature uses the angle defect `(2π - Σθ) / A` with the same area.
//!
//! Both estimators are only trustworthy at vertices with a complete
//! neighbourhood (see [`GroupTopology::has_complete_neighbourhood`]); at
//! boundary vertices they return a best-effort value.

use std::f32::consts::TAU;

use mesh_buffers::{AttributeKind, BufferError, Point3, Vector3};
use tracing::debug;

use crate::aggregate::MeshAggregate;
use crate::error::MeshResult;
use crate::id::PolyGroupId;
use crate::topology::GroupTopology;

/// Area, angle and cotangent-weighted sums around one vertex.
struct RingSums {
    area: f32,
    angle: f32,
    laplacian: Vector3<f32>,
}

fn ring_sums(positions: &[Point3<f32>], topology: &GroupTopology, i: usize) -> RingSums {
    let mut sums = RingSums {
        area: 0.0,
        angle: 0.0,
        laplacian: Vector3::zeros(),
    };
    let pi = positions[i];
    for &t in topology.parent_triangles(i) {
        let tri = topology.triangles()[t];
        let Some(k) = tri.iter().position(|&v| v == i) else {
            continue;
        };
        let j = tri[(k + 1) % 3];
        let l = tri[(k + 2) % 3];
        let (pj, pl) = (positions[j], positions[l]);

        let eij = pj - pi;
        let eil = pl - pi;
        sums.area += 0.5 * eij.cross(&eil).norm() / 3.0;
        sums.angle += eij.cross(&eil).norm().atan2(eij.dot(&eil));

        // Edge (i, j) is opposite corner l, edge (i, l) opposite corner j.
        sums.laplacian += eij * cot(pl, pi, pj) + eil * cot(pj, pi, pl);
    }
    sums
}

/// Cotangent of the angle at `apex` in the triangle `(apex, a, b)`.
fn cot(apex: Point3<f32>, a: Point3<f32>, b: Point3<f32>) -> f32 {
    let u = a - apex;
    let v = b - apex;
    u.dot(&v) / u.cross(&v).norm()
}

fn curvature_vector(positions: &[Point3<f32>], topology: &GroupTopology, i: usize) -> Vector3<f32> {
    if topology.parent_triangles(i).is_empty() {
        return Vector3::zeros();
    }
    let sums = ring_sums(positions, topology, i);
    sums.laplacian / (4.0 * sums.area)
}

fn signed_mean_curvature(vector: &Vector3<f32>, normal: &Vector3<f32>) -> f32 {
    let h = vector.norm();
    if vector.dot(normal) > 0.0 {
        -h
    } else {
        h
    }
}

impl MeshAggregate {
    /// Mean curvature vector at local vertex `i`.
    ///
    /// Zero for a vertex without incident triangles, as are
    /// [`mean_curvature`](Self::mean_curvature) and
    /// [`gauss_curvature`](Self::gauss_curvature).
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`](crate::MeshError::UnknownPolygroup)
    /// or [`MeshError::LocalIndexOutOfBounds`](crate::MeshError::LocalIndexOutOfBounds).
    pub fn mean_curvature_vector(&self, id: &PolyGroupId, i: usize) -> MeshResult<Vector3<f32>> {
        self.global_vertex_index(id, i)?;
        let topology = self.topology(id)?;
        let positions = self.group_positions(id)?;
        Ok(curvature_vector(&positions, &topology, i))
    }

    /// Signed mean curvature at local vertex `i`.
    ///
    /// Positive when the curvature vector opposes the stored vertex normal,
    /// i.e. for a convex surface with outward normals. Zero for a vertex
    /// without incident triangles.
    ///
    /// # Errors
    ///
    /// Same as [`mean_curvature_vector`](Self::mean_curvature_vector).
    pub fn mean_curvature(&self, id: &PolyGroupId, i: usize) -> MeshResult<f32> {
        let vector = self.mean_curvature_vector(id, i)?;
        let normal = self.vertex_view(id, i)?.normal();
        Ok(signed_mean_curvature(&vector, &normal))
    }

    /// Gauss curvature at local vertex `i` by angle defect.
    ///
    /// Zero for a vertex without incident triangles, where the defect and
    /// the area both vanish.
    ///
    /// # Errors
    ///
    /// Same as [`mean_curvature_vector`](Self::mean_curvature_vector).
    pub fn gauss_curvature(&self, id: &PolyGroupId, i: usize) -> MeshResult<f32> {
        self.global_vertex_index(id, i)?;
        let topology = self.topology(id)?;
        if topology.parent_triangles(i).is_empty() {
            return Ok(0.0);
        }
        let positions = self.group_positions(id)?;
        let sums = ring_sums(&positions, &topology, i);
        Ok((TAU - sums.angle) / sums.area)
    }

    /// One explicit Euler step of mean curvature flow on a polygroup.
    ///
    /// All curvature vectors are evaluated on the current positions before
    /// any vertex moves; every vertex then moves by `dt * K(i)`. The step
    /// size is not limited, so a large `dt` makes the mesh blow up.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`](crate::MeshError::UnknownPolygroup)
    /// if `id` does not exist.
    pub fn mean_curvature_flow_deform(&mut self, dt: f32, id: &PolyGroupId) -> MeshResult<()> {
        let topology = self.topology(id)?;
        let globals = self.group_vertices(id)?;
        if dt == 0.0 {
            return Ok(());
        }
        let positions = self.group_positions(id)?;

        let displacements: Vec<Vector3<f32>> = (0..positions.len())
            .map(|i| curvature_vector(&positions, &topology, i) * dt)
            .collect();

        for (local, displacement) in displacements.iter().enumerate() {
            self.store
                .set_position(globals[local], positions[local] + displacement)?;
        }

        debug!(
            "Mean curvature flow step dt={} on polygroup {} ({} vertices)",
            dt,
            id,
            globals.len()
        );
        Ok(())
    }

    /// [`mean_curvature_flow_deform`](Self::mean_curvature_flow_deform) on
    /// every polygroup.
    ///
    /// # Errors
    ///
    /// Propagates errors from the per-group call.
    pub fn mean_curvature_flow_all(&mut self, dt: f32) -> MeshResult<()> {
        for id in self.ids() {
            self.mean_curvature_flow_deform(dt, &id)?;
        }
        Ok(())
    }

    /// Write the signed mean curvature of every vertex into `extra0.w`.
    ///
    /// # Errors
    ///
    /// Returns a wrapped [`BufferError::NotImplemented`] when the store has
    /// no `extra0` buffer, and
    /// [`MeshError::UnknownPolygroup`](crate::MeshError::UnknownPolygroup)
    /// if `id` does not exist.
    pub fn paint_mean_curvature(&mut self, id: &PolyGroupId) -> MeshResult<()> {
        if !self.store.has_extra(0) {
            return Err(BufferError::NotImplemented {
                operation: "paint_mean_curvature",
                kind: AttributeKind::Extra0,
            }
            .into());
        }
        let topology = self.topology(id)?;
        let globals = self.group_vertices(id)?;
        let positions = self.group_positions(id)?;

        let values = (0..globals.len())
            .map(|i| {
                let vector = curvature_vector(&positions, &topology, i);
                let normal = self.store.normal(globals[i])?;
                Ok(signed_mean_curvature(&vector, &normal))
            })
            .collect::<MeshResult<Vec<f32>>>()?;

        for (global, h) in globals.iter().zip(values) {
            self.store.set_extra_component(*global, 0, 3, h)?;
        }
        Ok(())
    }

    /// [`paint_mean_curvature`](Self::paint_mean_curvature) on every polygroup.
    ///
    /// # Errors
    ///
    /// Propagates errors from the per-group call.
    pub fn paint_all_mean_curvature(&mut self) -> MeshResult<()> {
        for id in self.ids() {
            self.paint_mean_curvature(&id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::surface::FnSurface;
    use crate::MeshError;
    use approx::assert_relative_eq;
    use mesh_buffers::Vertex;
    use std::f32::consts::PI;

    fn sphere_id() -> PolyGroupId {
        PolyGroupId::from("sphere")
    }

    /// Unit sphere sampled on a (theta, phi) lattice, poles excluded.
    fn lattice_sphere(res: usize) -> MeshAggregate {
        let surface = FnSurface::new(
            |t: f32, u: f32| Point3::new(t.sin() * u.cos(), t.sin() * u.sin(), t.cos()),
            (0.3, PI - 0.3),
            (0.0, PI),
        );
        MeshAggregate::from_surface(&surface, res, res, sphere_id()).unwrap()
    }

    fn interior(res: usize) -> usize {
        let mid = res / 2;
        mid * res + mid
    }

    #[test]
    fn sphere_mean_curvature_is_one() {
        let res = 41;
        let mesh = lattice_sphere(res);
        let i = interior(res);
        assert!(mesh.check_if_has_complete_neighbourhood(&sphere_id(), i).unwrap());
        let vector = mesh.mean_curvature_vector(&sphere_id(), i).unwrap();
        assert_relative_eq!(vector.norm(), 1.0, epsilon = 0.05);
        let p = mesh.vertex_view(&sphere_id(), i).unwrap().position();
        // Points towards the centre.
        assert!(vector.dot(&p.coords) < 0.0);
    }

    #[test]
    fn sphere_gauss_curvature_is_one() {
        let res = 41;
        let mesh = lattice_sphere(res);
        let k = mesh.gauss_curvature(&sphere_id(), interior(res)).unwrap();
        assert_relative_eq!(k, 1.0, epsilon = 0.05);
    }

    #[test]
    fn mean_curvature_sign_follows_normal() {
        let res = 21;
        let mut mesh = lattice_sphere(res);
        let i = interior(res);
        let p = mesh.vertex_view(&sphere_id(), i).unwrap().position();
        mesh.vertex_view_mut(&sphere_id(), i)
            .unwrap()
            .set_normal(p.coords);
        assert!(mesh.mean_curvature(&sphere_id(), i).unwrap() > 0.0);
        mesh.vertex_view_mut(&sphere_id(), i)
            .unwrap()
            .set_normal(-p.coords);
        assert!(mesh.mean_curvature(&sphere_id(), i).unwrap() < 0.0);
    }

    #[test]
    fn flat_mesh_has_zero_curvature() {
        let vertices: Vec<Vertex> = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [-1.0, 0.0, 0.0],
            [0.0, -1.0, 0.0],
        ]
        .into_iter()
        .map(Vertex::from)
        .collect();
        let faces = [[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]];
        let id = PolyGroupId::from(0);
        let mesh = MeshAggregate::from_polygroup(&vertices, &faces, id.clone()).unwrap();
        assert_relative_eq!(mesh.mean_curvature_vector(&id, 0).unwrap(), Vector3::zeros(), epsilon = 1e-6);
        assert_relative_eq!(mesh.gauss_curvature(&id, 0).unwrap(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn isolated_vertex_has_zero_curvatures() {
        let vertices: Vec<Vertex> = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [5.0, 5.0, 5.0]]
            .into_iter()
            .map(Vertex::from)
            .collect();
        let id = PolyGroupId::from(0);
        let mut mesh = MeshAggregate::from_polygroup(&vertices, &[[0, 1, 2]], id.clone()).unwrap();
        assert_eq!(mesh.mean_curvature_vector(&id, 3).unwrap(), Vector3::zeros());
        assert_eq!(mesh.mean_curvature(&id, 3).unwrap(), 0.0);
        let gauss = mesh.gauss_curvature(&id, 3).unwrap();
        assert!(!gauss.is_nan());
        assert_eq!(gauss, 0.0);
        mesh.mean_curvature_flow_deform(0.1, &id).unwrap();
        assert_eq!(mesh.vertex_view(&id, 3).unwrap().position(), Point3::new(5.0, 5.0, 5.0));
    }

    #[test]
    fn zero_step_flow_is_identity() {
        let mut mesh = lattice_sphere(11);
        let before = mesh.vertices(&sphere_id()).unwrap();
        mesh.mean_curvature_flow_deform(0.0, &sphere_id()).unwrap();
        assert_eq!(mesh.vertices(&sphere_id()).unwrap(), before);
    }

    #[test]
    fn flow_shrinks_sphere() {
        let res = 21;
        let mut mesh = lattice_sphere(res);
        let i = interior(res);
        let r0 = mesh.vertex_view(&sphere_id(), i).unwrap().position().coords.norm();
        mesh.mean_curvature_flow_deform(0.01, &sphere_id()).unwrap();
        let r1 = mesh.vertex_view(&sphere_id(), i).unwrap().position().coords.norm();
        assert!(r1 < r0);
        assert_relative_eq!(r0 - r1, 0.01, epsilon = 0.002);
    }

    #[test]
    fn paint_requires_extra0() {
        let mut mesh = lattice_sphere(5);
        assert!(matches!(
            mesh.paint_mean_curvature(&sphere_id()),
            Err(MeshError::Buffer(BufferError::NotImplemented { .. }))
        ));
    }

    #[test]
    fn paint_writes_w_component() {
        let res = 21;
        let source = lattice_sphere(res);
        let mut mesh = MeshAggregate::with_material(false, &[0]);
        mesh.copy_polygroup_from(&source, &sphere_id(), sphere_id()).unwrap();
        mesh.paint_mean_curvature(&sphere_id()).unwrap();

        let i = interior(res);
        let painted = mesh.vertex_view(&sphere_id(), i).unwrap().extra(0).unwrap().w;
        let expected = mesh.mean_curvature(&sphere_id(), i).unwrap();
        assert_relative_eq!(painted, expected);
    }
}
