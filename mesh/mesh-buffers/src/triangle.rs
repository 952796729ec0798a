//! Non-owning triangle handles and per-triangle geometry.

use std::ptr;

use nalgebra::{Matrix2, Matrix3, Point3, Vector2, Vector3};

use crate::error::{BufferError, BufferResult};
use crate::kind::AttributeKind;
use crate::store::AttributeBufferStore;
use crate::view::VertexView;

/// Read-only handle to one triangle slot of a store.
///
/// All derived quantities are recomputed from the current vertex positions
/// on every call. Degenerate (zero-area) triangles are not special-cased:
/// their normal, frame and barycentric mapping contain NaN.
///
/// # Example
///
/// ```
/// use mesh_buffers::{AttributeBufferStore, Vertex, Vector3};
///
/// let mut store = AttributeBufferStore::new();
/// for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
///     store.add_vertex(&Vertex::from(p))?;
/// }
/// store.add_triangle_indices([0, 1, 2], 0)?;
///
/// let tri = store.triangle_view(0)?;
/// assert_eq!(tri.face_normal(), Vector3::z());
/// assert_eq!(tri.area(), 0.5);
/// # Ok::<(), mesh_buffers::BufferError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TriangleView<'a> {
    store: &'a AttributeBufferStore,
    slot: usize,
}

impl<'a> TriangleView<'a> {
    fn new(store: &'a AttributeBufferStore, slot: usize) -> BufferResult<Self> {
        let len = store.triangle_count();
        if slot >= len {
            return Err(BufferError::IndexOutOfBounds {
                kind: AttributeKind::Index,
                index: slot,
                len,
            });
        }
        Ok(Self { store, slot })
    }

    /// Triangle slot in the index buffer.
    #[inline]
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    /// Store indices of the three corners.
    #[inline]
    #[must_use]
    pub fn vertex_indices(&self) -> [u32; 3] {
        self.store.face_indices_unchecked(self.slot)
    }

    /// View of corner `k` (taken modulo 3).
    #[must_use]
    pub fn vertex(&self, k: usize) -> VertexView<'a> {
        // Stored indices are always < vertex_count.
        VertexView::new_unchecked(self.store, self.vertex_indices()[k % 3] as usize)
    }

    /// Corner positions.
    #[must_use]
    pub fn positions(&self) -> [Point3<f32>; 3] {
        self.vertex_indices()
            .map(|i| self.store.position_unchecked(i as usize))
    }

    /// Unnormalised normal `(v1 - v0) × (v2 - v0)`.
    #[must_use]
    pub fn cross(&self) -> Vector3<f32> {
        let [v0, v1, v2] = self.positions();
        (v1 - v0).cross(&(v2 - v0))
    }

    /// Unit face normal following the winding. NaN for degenerate triangles.
    #[must_use]
    pub fn face_normal(&self) -> Vector3<f32> {
        let c = self.cross();
        c / c.norm()
    }

    /// Triangle area.
    #[must_use]
    pub fn area(&self) -> f32 {
        0.5 * self.cross().norm()
    }

    /// Centroid of the corners.
    #[must_use]
    pub fn center(&self) -> Point3<f32> {
        let [v0, v1, v2] = self.positions();
        Point3::from((v0.coords + v1.coords + v2.coords) / 3.0)
    }

    /// Orthonormal frame of the triangle plane.
    ///
    /// Columns are `(e0, e1, n)`: `e0` runs along the first edge, `e1` is the
    /// Gram–Schmidt remainder of the second edge and `n = e0 × e1`.
    #[must_use]
    pub fn orthonormal_frame(&self) -> Matrix3<f32> {
        let [v0, v1, v2] = self.positions();
        let a = v1 - v0;
        let e0 = a / a.norm();
        let b = v2 - v0;
        let r = b - e0 * b.dot(&e0);
        let e1 = r / r.norm();
        Matrix3::from_columns(&[e0, e1, e0.cross(&e1)])
    }

    /// In-plane coordinates of `p` relative to corner 0.
    ///
    /// Points off the plane are projected orthogonally.
    #[must_use]
    pub fn to_planar(&self, p: &Point3<f32>) -> Vector2<f32> {
        let frame = self.orthonormal_frame();
        let d = p - self.positions()[0];
        Vector2::new(frame.column(0).dot(&d), frame.column(1).dot(&d))
    }

    /// Inverse of [`to_planar`](Self::to_planar) for points in the plane.
    #[must_use]
    pub fn from_planar(&self, q: &Vector2<f32>) -> Point3<f32> {
        let frame = self.orthonormal_frame();
        self.positions()[0] + frame.column(0) * q.x + frame.column(1) * q.y
    }

    /// Planar coordinates of corners 1 and 2 as columns.
    #[must_use]
    pub fn bar_matrix(&self) -> Matrix2<f32> {
        let [_, v1, v2] = self.positions();
        Matrix2::from_columns(&[self.to_planar(&v1), self.to_planar(&v2)])
    }

    /// Barycentric weights `(λ1, λ2)` of `p` with respect to corners 1 and 2.
    ///
    /// The weight of corner 0 is `1 - λ1 - λ2`.
    #[must_use]
    pub fn to_bars(&self, p: &Point3<f32>) -> Vector2<f32> {
        let inverse = self
            .bar_matrix()
            .try_inverse()
            .unwrap_or_else(|| Matrix2::from_element(f32::NAN));
        inverse * self.to_planar(p)
    }

    /// Point with barycentric weights `(λ1, λ2)`.
    #[must_use]
    pub fn from_bars(&self, bars: &Vector2<f32>) -> Point3<f32> {
        self.from_planar(&(self.bar_matrix() * bars))
    }

    /// Inset triangle with edges parallel to this one at distance `width`.
    ///
    /// Each corner moves along its angle bisector. The result degenerates
    /// once `width` reaches the inradius.
    #[must_use]
    pub fn border_triangle(&self, width: f32) -> [Point3<f32>; 3] {
        let p = self.positions();
        std::array::from_fn(|k| {
            let a = (p[(k + 1) % 3] - p[k]).normalize();
            let b = (p[(k + 2) % 3] - p[k]).normalize();
            p[k] + (a + b) * (width / a.cross(&b).norm())
        })
    }

    /// Check whether the unordered pair `{i, j}` is one of the three edges.
    #[must_use]
    pub fn contains_edge(&self, i: u32, j: u32) -> bool {
        let [a, b, c] = self.vertex_indices();
        [(a, b), (b, c), (c, a)]
            .iter()
            .any(|&(x, y)| (x == i && y == j) || (x == j && y == i))
    }

    /// Check whether store vertex `i` is a corner.
    #[must_use]
    pub fn contains_vertex(&self, i: u32) -> bool {
        self.vertex_indices().contains(&i)
    }

    /// Corner number (0, 1 or 2) of store vertex `i`.
    #[must_use]
    pub fn corner_of(&self, i: u32) -> Option<usize> {
        self.vertex_indices().iter().position(|&v| v == i)
    }

    /// Interior angle at corner `k` (taken modulo 3), in radians.
    #[must_use]
    pub fn angle_at(&self, k: usize) -> f32 {
        let (a, b) = self.corner_edges(k);
        a.cross(&b).norm().atan2(a.dot(&b))
    }

    /// Cotangent of the interior angle at corner `k`.
    #[must_use]
    pub fn cot_at(&self, k: usize) -> f32 {
        let (a, b) = self.corner_edges(k);
        a.dot(&b) / a.cross(&b).norm()
    }

    /// Store indices of the edge opposite corner `k`, in winding order.
    #[must_use]
    pub fn edge_opposite(&self, k: usize) -> [u32; 2] {
        let idx = self.vertex_indices();
        [idx[(k + 1) % 3], idx[(k + 2) % 3]]
    }

    /// Check whether the directed edge `i -> j` appears in the winding.
    #[must_use]
    pub fn has_directed_edge(&self, i: u32, j: u32) -> bool {
        let [a, b, c] = self.vertex_indices();
        [(a, b), (b, c), (c, a)].contains(&(i, j))
    }

    fn corner_edges(&self, k: usize) -> (Vector3<f32>, Vector3<f32>) {
        let p = self.positions();
        let k = k % 3;
        (p[(k + 1) % 3] - p[k], p[(k + 2) % 3] - p[k])
    }
}

impl PartialEq for TriangleView<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.store, other.store) && self.slot == other.slot
    }
}

impl Eq for TriangleView<'_> {}

/// Read-write handle to one triangle slot.
#[derive(Debug)]
pub struct TriangleViewMut<'a> {
    store: &'a mut AttributeBufferStore,
    slot: usize,
}

impl TriangleViewMut<'_> {
    /// Triangle slot in the index buffer.
    #[inline]
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot
    }

    /// Reborrow as a read-only view.
    #[must_use]
    pub fn as_view(&self) -> TriangleView<'_> {
        TriangleView {
            store: &*self.store,
            slot: self.slot,
        }
    }

    /// Store indices of the three corners.
    #[must_use]
    pub fn vertex_indices(&self) -> [u32; 3] {
        self.store.face_indices_unchecked(self.slot)
    }

    /// Rewrite the corner indices.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfBounds`] if an index does not name an
    /// existing vertex.
    pub fn set_vertex_indices(&mut self, indices: [u32; 3]) -> BufferResult<()> {
        self.store.set_face_indices(self.slot, indices)
    }

    /// Reverse the winding: `(a, b, c)` becomes `(c, b, a)`.
    pub fn change_orientation(&mut self) {
        let [a, b, c] = self.vertex_indices();
        self.store.set_face_indices_unchecked(self.slot, [c, b, a]);
    }
}

impl AttributeBufferStore {
    /// Read-only view of a triangle slot.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfBounds`] if `slot >= triangle_count()`.
    pub fn triangle_view(&self, slot: usize) -> BufferResult<TriangleView<'_>> {
        TriangleView::new(self, slot)
    }

    /// Read-write view of a triangle slot.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::IndexOutOfBounds`] if `slot >= triangle_count()`.
    pub fn triangle_view_mut(&mut self, slot: usize) -> BufferResult<TriangleViewMut<'_>> {
        let len = self.triangle_count();
        if slot >= len {
            return Err(BufferError::IndexOutOfBounds {
                kind: AttributeKind::Index,
                index: slot,
                len,
            });
        }
        Ok(TriangleViewMut { store: self, slot })
    }

    /// Views of every triangle, in slot order.
    pub fn triangle_views(&self) -> impl Iterator<Item = TriangleView<'_>> {
        (0..self.triangle_count()).map(move |slot| TriangleView { store: self, slot })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::vertex::Vertex;
    use approx::assert_relative_eq;

    fn store_from(points: &[[f32; 3]], faces: &[[u32; 3]]) -> AttributeBufferStore {
        let mut store = AttributeBufferStore::new();
        for p in points {
            store.add_vertex(&Vertex::from(*p)).unwrap();
        }
        for f in faces {
            store.add_triangle_indices(*f, 0).unwrap();
        }
        store
    }

    fn reference() -> AttributeBufferStore {
        store_from(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]], &[[0, 1, 2]])
    }

    #[test]
    fn reference_normal_and_area() {
        let store = reference();
        let tri = store.triangle_view(0).unwrap();
        assert_eq!(tri.face_normal(), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(tri.area(), 0.5);
        assert_relative_eq!(tri.center(), Point3::new(1.0 / 3.0, 1.0 / 3.0, 0.0));
    }

    #[test]
    fn degenerate_triangle_yields_nan_normal() {
        let store = store_from(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]], &[[0, 1, 2]]);
        let tri = store.triangle_view(0).unwrap();
        assert!(tri.face_normal().iter().any(|c| c.is_nan()));
        assert_eq!(tri.area(), 0.0);
    }

    #[test]
    fn frame_is_orthonormal() {
        let store = store_from(&[[0.3, -1.0, 2.0], [1.5, 0.2, 2.5], [-0.4, 0.9, 1.1]], &[[0, 1, 2]]);
        let tri = store.triangle_view(0).unwrap();
        let frame = tri.orthonormal_frame();
        assert_relative_eq!(frame.transpose() * frame, Matrix3::identity(), epsilon = 1e-5);
        assert_relative_eq!(frame.column(2).into_owned(), tri.face_normal(), epsilon = 1e-5);
    }

    #[test]
    fn planar_and_barycentric_round_trip() {
        let store = store_from(&[[0.3, -1.0, 2.0], [1.5, 0.2, 2.5], [-0.4, 0.9, 1.1]], &[[0, 1, 2]]);
        let tri = store.triangle_view(0).unwrap();
        let [v0, v1, v2] = tri.positions();

        assert_relative_eq!(tri.to_bars(&v1), Vector2::new(1.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(tri.to_bars(&v2), Vector2::new(0.0, 1.0), epsilon = 1e-5);
        assert_relative_eq!(tri.to_bars(&v0), Vector2::zeros(), epsilon = 1e-5);

        let inside = tri.from_bars(&Vector2::new(0.25, 0.5));
        assert_relative_eq!(tri.to_bars(&inside), Vector2::new(0.25, 0.5), epsilon = 1e-5);

        let q = Vector2::new(0.7, -0.2);
        assert_relative_eq!(tri.to_planar(&tri.from_planar(&q)), q, epsilon = 1e-5);
    }

    #[test]
    fn border_triangle_is_inset_by_width() {
        let store = store_from(&[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [0.0, 4.0, 0.0]], &[[0, 1, 2]]);
        let tri = store.triangle_view(0).unwrap();
        let inner = tri.border_triangle(0.5);
        // Corner 0 sits at the right angle, so it moves diagonally by (w, w).
        assert_relative_eq!(inner[0], Point3::new(0.5, 0.5, 0.0), epsilon = 1e-5);
        for q in inner {
            assert!(q.y >= 0.5 - 1e-5);
            assert!(q.x >= 0.5 - 1e-5);
        }
    }

    #[test]
    fn edges_and_angles() {
        let store = reference();
        let tri = store.triangle_view(0).unwrap();
        assert!(tri.contains_edge(2, 1));
        assert!(tri.contains_edge(0, 2));
        assert!(!tri.contains_edge(0, 3));
        assert!(tri.has_directed_edge(1, 2));
        assert!(!tri.has_directed_edge(2, 1));
        assert_relative_eq!(tri.angle_at(0), std::f32::consts::FRAC_PI_2);
        assert_relative_eq!(tri.angle_at(1), std::f32::consts::FRAC_PI_4, epsilon = 1e-6);
        assert_relative_eq!(tri.cot_at(1), 1.0, epsilon = 1e-6);
        assert_eq!(tri.edge_opposite(0), [1, 2]);
        assert_eq!(tri.corner_of(2), Some(2));
        assert_eq!(tri.vertex(4).index(), 1);
    }

    #[test]
    fn change_orientation_reverses_normal() {
        let mut store = reference();
        store.triangle_view_mut(0).unwrap().change_orientation();
        let tri = store.triangle_view(0).unwrap();
        assert_eq!(tri.vertex_indices(), [2, 1, 0]);
        assert_eq!(tri.face_normal(), Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn set_vertex_indices_is_checked() {
        let mut store = reference();
        let mut tri = store.triangle_view_mut(0).unwrap();
        assert!(tri.set_vertex_indices([0, 1, 3]).is_err());
        tri.set_vertex_indices([1, 2, 0]).unwrap();
        assert_eq!(tri.vertex_indices(), [1, 2, 0]);
        assert!(store.triangle_view(1).is_err());
    }
}
