//! Area-weighted integrals over a polygroup's triangles.

use std::iter::Sum;
use std::ops::Mul;

use mesh_buffers::{Matrix3, Point3, TriangleView, Vector3};

use crate::aggregate::MeshAggregate;
use crate::error::{MeshError, MeshResult};
use crate::id::PolyGroupId;

impl MeshAggregate {
    /// `Σ f(t) · area(t)` over the polygroup's triangles.
    ///
    /// The empty sum is `T`'s [`Sum`] of nothing (zero for scalars,
    /// vectors and matrices).
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist.
    pub fn integrate_over_triangles<T, F>(&self, id: &PolyGroupId, f: F) -> MeshResult<T>
    where
        T: Sum + Mul<f32, Output = T>,
        F: Fn(&TriangleView<'_>) -> T,
    {
        Ok(self
            .triangle_views(id)?
            .iter()
            .map(|t| f(t) * t.area())
            .sum())
    }

    /// Total triangle area of a polygroup.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist.
    pub fn surface_area(&self, id: &PolyGroupId) -> MeshResult<f32> {
        self.integrate_over_triangles(id, |_| 1.0_f32)
    }

    /// Area-weighted centroid of a polygroup's surface.
    ///
    /// # Errors
    ///
    /// - [`MeshError::UnknownPolygroup`] if `id` does not exist;
    /// - [`MeshError::EmptyPolygroup`] if it has no triangles.
    pub fn center_of_mass(&self, id: &PolyGroupId) -> MeshResult<Point3<f32>> {
        if self.triangle_count(id)? == 0 {
            return Err(MeshError::EmptyPolygroup(id.clone()));
        }
        let area = self.surface_area(id)?;
        let moment: Vector3<f32> = self.integrate_over_triangles(id, |t| t.center().coords)?;
        Ok(Point3::from(moment / area))
    }

    /// Area-weighted centroid over every polygroup.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::IllegalArgument`] if the aggregate has no triangles.
    pub fn center_of_mass_all(&self) -> MeshResult<Point3<f32>> {
        if self.total_triangle_count() == 0 {
            return Err(MeshError::IllegalArgument(
                "centre of mass of a mesh without triangles".into(),
            ));
        }
        let mut area = 0.0;
        let mut moment = Vector3::zeros();
        for id in self.polygroup_ids() {
            area += self.surface_area(id)?;
            moment += self.integrate_over_triangles(id, |t| t.center().coords)?;
        }
        Ok(Point3::from(moment / area))
    }

    /// Second moment `Σ A_t (|r|² I − r rᵀ)` with `r = center_t − p`.
    ///
    /// Each triangle is lumped at its centroid.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist.
    pub fn inertia_tensor_about(&self, id: &PolyGroupId, p: &Point3<f32>) -> MeshResult<Matrix3<f32>> {
        self.integrate_over_triangles(id, |t| {
            let r = t.center() - p;
            Matrix3::identity() * r.norm_squared() - r * r.transpose()
        })
    }

    /// [`inertia_tensor_about`](Self::inertia_tensor_about) the polygroup's
    /// centre of mass.
    ///
    /// # Errors
    ///
    /// As for [`center_of_mass`](Self::center_of_mass).
    pub fn inertia_tensor_cm(&self, id: &PolyGroupId) -> MeshResult<Matrix3<f32>> {
        let cm = self.center_of_mass(id)?;
        self.inertia_tensor_about(id, &cm)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_buffers::Vertex;

    fn square(z: f32, id: PolyGroupId) -> MeshAggregate {
        let vertices: Vec<Vertex> = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]]
            .into_iter()
            .map(|[x, y]| Vertex::from_coords(x, y, z))
            .collect();
        MeshAggregate::from_polygroup(&vertices, &[[0, 1, 2], [0, 2, 3]], id).unwrap()
    }

    #[test]
    fn area_of_square() {
        let id = PolyGroupId::from(0);
        let mesh = square(0.0, id.clone());
        assert_relative_eq!(mesh.surface_area(&id).unwrap(), 4.0, epsilon = 1e-6);
    }

    #[test]
    fn symmetric_mesh_center() {
        let id = PolyGroupId::from(0);
        let mesh = square(2.0, id.clone());
        assert_relative_eq!(
            mesh.center_of_mass(&id).unwrap(),
            Point3::new(0.0, 0.0, 2.0),
            epsilon = 1e-6
        );
    }

    #[test]
    fn center_over_all_groups() {
        let mut mesh = square(0.0, PolyGroupId::from(0));
        mesh.merge(&square(4.0, PolyGroupId::from(1))).unwrap();
        assert_relative_eq!(
            mesh.center_of_mass_all().unwrap(),
            Point3::new(0.0, 0.0, 2.0),
            epsilon = 1e-6
        );
    }

    #[test]
    fn empty_group_has_no_center() {
        let id = PolyGroupId::from(0);
        let mut mesh = MeshAggregate::new();
        mesh.add_new_polygroup(&[Vertex::from_coords(0.0, 0.0, 0.0)], &[], id.clone())
            .unwrap();
        assert_eq!(
            mesh.center_of_mass(&id).unwrap_err(),
            MeshError::EmptyPolygroup(id)
        );
        assert!(mesh.center_of_mass_all().is_err());
    }

    #[test]
    fn inertia_tensor_is_symmetric_and_planar() {
        let id = PolyGroupId::from(0);
        let mesh = square(0.0, id.clone());
        let inertia = mesh.inertia_tensor_cm(&id).unwrap();
        assert_relative_eq!(inertia, inertia.transpose(), epsilon = 1e-6);
        // Perpendicular axis theorem for a planar body.
        assert_relative_eq!(inertia[(2, 2)], inertia[(0, 0)] + inertia[(1, 1)], epsilon = 1e-5);
    }

    #[test]
    fn integrate_vector_quantity() {
        let id = PolyGroupId::from(0);
        let mesh = square(0.0, id.clone());
        let flux: Vector3<f32> = mesh
            .integrate_over_triangles(&id, |t| t.face_normal())
            .unwrap();
        assert_relative_eq!(flux, Vector3::new(0.0, 0.0, 4.0), epsilon = 1e-6);
    }
}
