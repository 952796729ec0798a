//! Parametric surface sampling.

use mesh_buffers::{Point3, Vector2, Vector3, Vector4, Vertex};
use tracing::debug;

use crate::aggregate::{to_u32, MeshAggregate};
use crate::error::{MeshError, MeshResult};
use crate::id::PolyGroupId;

/// Step used by the default finite-difference normal.
const NORMAL_STEP: f32 = 1e-3;

/// A surface `(t, u) -> R³` over a rectangular parameter domain.
///
/// Only evaluation is required; [`normal`](Self::normal) defaults to the
/// normalised cross product of central differences along `t` and `u`, which
/// matches the winding of sampled lattices.
pub trait ParametricSurface {
    /// Surface point at `(t, u)`.
    fn position(&self, t: f32, u: f32) -> Point3<f32>;

    /// Parameter ranges `((t_min, t_max), (u_min, u_max))`.
    fn domain(&self) -> ((f32, f32), (f32, f32));

    /// Unit normal at `(t, u)`, oriented as `∂t × ∂u`.
    fn normal(&self, t: f32, u: f32) -> Vector3<f32> {
        let h = NORMAL_STEP;
        let dt = self.position(t + h, u) - self.position(t - h, u);
        let du = self.position(t, u + h) - self.position(t, u - h);
        let n = dt.cross(&du);
        n.try_normalize(0.0).unwrap_or(n)
    }
}

/// Adapter turning a closure into a [`ParametricSurface`].
///
/// # Example
///
/// ```
/// use mesh_polygroup::{FnSurface, ParametricSurface};
/// use mesh_buffers::Point3;
///
/// let plane = FnSurface::new(|t, u| Point3::new(t, u, 0.0), (0.0, 1.0), (0.0, 1.0));
/// assert!((plane.normal(0.5, 0.5).z - 1.0).abs() < 1e-4);
/// ```
#[derive(Debug, Clone)]
pub struct FnSurface<F> {
    f: F,
    t_range: (f32, f32),
    u_range: (f32, f32),
}

impl<F> FnSurface<F>
where
    F: Fn(f32, f32) -> Point3<f32>,
{
    /// Wrap `f` with the given parameter ranges.
    pub const fn new(f: F, t_range: (f32, f32), u_range: (f32, f32)) -> Self {
        Self {
            f,
            t_range,
            u_range,
        }
    }
}

impl<F> ParametricSurface for FnSurface<F>
where
    F: Fn(f32, f32) -> Point3<f32>,
{
    fn position(&self, t: f32, u: f32) -> Point3<f32> {
        (self.f)(t, u)
    }

    fn domain(&self) -> ((f32, f32), (f32, f32)) {
        (self.t_range, self.u_range)
    }
}

/// Evenly spaced samples of `range`, endpoints included.
pub(crate) fn linspace(range: (f32, f32), n: usize) -> impl Iterator<Item = f32> {
    let (a, b) = range;
    let last = (n.max(2) - 1) as f32;
    (0..n).map(move |i| a + (b - a) * (i as f32 / last))
}

/// Triangles of a `t_res × u_res` lattice numbered `i * u_res + j`.
///
/// Cell `(i, j)` spans `a = (i, j)`, `b = (i + 1, j)`, `c = (i, j + 1)` and
/// `d = (i + 1, j + 1)` and always becomes `(a, b, d)` and `(a, d, c)`.
pub(crate) fn lattice_faces(t_res: usize, u_res: usize) -> MeshResult<Vec<[u32; 3]>> {
    let mut faces = Vec::with_capacity(2 * t_res.saturating_sub(1) * u_res.saturating_sub(1));
    for i in 0..t_res.saturating_sub(1) {
        for j in 0..u_res.saturating_sub(1) {
            let a = to_u32(i * u_res + j)?;
            let b = to_u32((i + 1) * u_res + j)?;
            let c = to_u32(i * u_res + j + 1)?;
            let d = to_u32((i + 1) * u_res + j + 1)?;
            faces.push([a, b, d]);
            faces.push([a, d, c]);
        }
    }
    Ok(faces)
}

fn check_resolution(t_res: usize, u_res: usize) -> MeshResult<()> {
    if t_res < 2 || u_res < 2 {
        return Err(MeshError::IllegalArgument(format!(
            "surface lattice needs at least 2x2 samples, got {t_res}x{u_res}"
        )));
    }
    Ok(())
}

impl MeshAggregate {
    /// Sample a surface on a regular lattice into a new aggregate.
    ///
    /// See [`add_uniform_surface`](Self::add_uniform_surface).
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::IllegalArgument`] if either resolution is below 2.
    pub fn from_surface<S>(surface: &S, t_res: usize, u_res: usize, id: PolyGroupId) -> MeshResult<Self>
    where
        S: ParametricSurface + ?Sized,
    {
        let mut mesh = Self::new();
        mesh.add_uniform_surface(surface, t_res, u_res, id)?;
        Ok(mesh)
    }

    /// Sample a surface on a regular `t_res × u_res` lattice as a polygroup.
    ///
    /// Lattice point `(i, j)` becomes local vertex `i * u_res + j` with
    /// position and normal from the surface, uv `(i / (t_res - 1),
    /// j / (u_res - 1))` and color `(t, u, 0, 1)`. The color keeps the
    /// surface parameters so the mesh can later follow a changed surface
    /// with [`adjust_to_new_surface`](Self::adjust_to_new_surface).
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::IllegalArgument`] if either resolution is below 2.
    pub fn add_uniform_surface<S>(
        &mut self,
        surface: &S,
        t_res: usize,
        u_res: usize,
        id: PolyGroupId,
    ) -> MeshResult<()>
    where
        S: ParametricSurface + ?Sized,
    {
        check_resolution(t_res, u_res)?;
        let (t_range, u_range) = surface.domain();
        let t_last = (t_res - 1) as f32;
        let u_last = (u_res - 1) as f32;

        let mut vertices = Vec::with_capacity(t_res * u_res);
        for (i, t) in linspace(t_range, t_res).enumerate() {
            for (j, u) in linspace(u_range, u_res).enumerate() {
                vertices.push(Vertex::new(
                    surface.position(t, u),
                    surface.normal(t, u),
                    Vector2::new(i as f32 / t_last, j as f32 / u_last),
                    Vector4::new(t, u, 0.0, 1.0),
                ));
            }
        }
        let faces = lattice_faces(t_res, u_res)?;

        debug!("Sampled {}x{} surface lattice into polygroup {}", t_res, u_res, id);
        self.add_new_polygroup(&vertices, &faces, id)
    }

    /// Re-evaluate a polygroup on another surface at each vertex's stored
    /// parameters (color `x`, `y`).
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist.
    pub fn adjust_to_new_surface<S>(&mut self, surface: &S, id: &PolyGroupId) -> MeshResult<()>
    where
        S: ParametricSurface + ?Sized,
    {
        for v in self.group_vertices(id)? {
            let color = self.store.color(v)?;
            let (t, u) = (color.x, color.y);
            self.store.set_position(v, surface.position(t, u))?;
            self.store.set_normal(v, surface.normal(t, u))?;
        }
        Ok(())
    }

    /// [`adjust_to_new_surface`](Self::adjust_to_new_surface) on every polygroup.
    ///
    /// # Errors
    ///
    /// Propagates errors from the per-group call.
    pub fn adjust_all_to_new_surface<S>(&mut self, surface: &S) -> MeshResult<()>
    where
        S: ParametricSurface + ?Sized,
    {
        for id in self.ids() {
            self.adjust_to_new_surface(surface, &id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn plane() -> FnSurface<impl Fn(f32, f32) -> Point3<f32>> {
        FnSurface::new(|t, u| Point3::new(t, u, 0.0), (0.0, 2.0), (0.0, 1.0))
    }

    #[test]
    fn lattice_counts_and_layout() {
        let id = PolyGroupId::from(0);
        let mesh = MeshAggregate::from_surface(&plane(), 4, 3, id.clone()).unwrap();
        assert_eq!(mesh.vertex_count(&id).unwrap(), 12);
        assert_eq!(mesh.triangle_count(&id).unwrap(), 2 * 3 * 2);

        // Local vertex i * u_res + j sits at lattice point (i, j).
        let v = mesh.vertex_view(&id, 2 * 3 + 1).unwrap();
        assert_relative_eq!(v.position(), Point3::new(4.0 / 3.0, 0.5, 0.0), epsilon = 1e-6);
        assert_relative_eq!(v.uv(), Vector2::new(2.0 / 3.0, 0.5), epsilon = 1e-6);
        assert_relative_eq!(v.color(), Vector4::new(4.0 / 3.0, 0.5, 0.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn lattice_orientation_is_continuous() {
        let id = PolyGroupId::from(0);
        let mut mesh = MeshAggregate::from_surface(&plane(), 5, 5, id.clone()).unwrap();
        for t in mesh.triangle_views(&id).unwrap() {
            assert_relative_eq!(t.face_normal(), Vector3::z(), epsilon = 1e-6);
        }
        assert_eq!(mesh.orient_faces(&id).unwrap(), 0);
    }

    #[test]
    fn first_cell_diagonal() {
        let faces = lattice_faces(2, 2).unwrap();
        assert_eq!(faces, vec![[0, 2, 3], [0, 3, 1]]);
    }

    #[test]
    fn too_small_lattice_rejected() {
        assert!(matches!(
            MeshAggregate::from_surface(&plane(), 1, 5, PolyGroupId::from(0)),
            Err(MeshError::IllegalArgument(_))
        ));
    }

    #[test]
    fn adjust_follows_new_surface() {
        let id = PolyGroupId::from(0);
        let mut mesh = MeshAggregate::from_surface(&plane(), 3, 3, id.clone()).unwrap();
        let lifted = FnSurface::new(|t, u| Point3::new(t, u, 1.0 + t), (0.0, 2.0), (0.0, 1.0));
        mesh.adjust_to_new_surface(&lifted, &id).unwrap();
        for v in mesh.vertex_views(&id).unwrap() {
            let p = v.position();
            assert_relative_eq!(p.z, 1.0 + p.x, epsilon = 1e-6);
        }
        assert_eq!(mesh.triangle_count(&id).unwrap(), 8);
    }

    #[test]
    fn default_normal_matches_winding() {
        let n = plane().normal(0.3, 0.7);
        assert_relative_eq!(n, Vector3::z(), epsilon = 1e-4);
    }
}
