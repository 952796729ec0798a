//! Solid ribbon geometry along triangle edges.

use mesh_buffers::{Point3, Vertex};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::{to_u32, MeshAggregate};
use crate::error::{MeshError, MeshResult};
use crate::id::PolyGroupId;

/// Ridge profile of [`MeshAggregate::wireframe`].
///
/// # Example
///
/// ```
/// use mesh_polygroup::WireframeParams;
///
/// let params = WireframeParams::default()
///     .with_width(0.02)
///     .with_height_center(0.01);
/// assert!((params.width - 0.02).abs() < f32::EPSILON);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WireframeParams {
    /// Distance from each edge to the inner border of its ribbon.
    pub width: f32,
    /// Lift of the ridge line above the ribbon's sides, along the face normal.
    pub height_center: f32,
    /// Lift of both ribbon sides above the face, along the face normal.
    pub height_side: f32,
}

impl Default for WireframeParams {
    fn default() -> Self {
        Self {
            width: 0.01,
            height_center: 0.005,
            height_side: 0.0,
        }
    }
}

impl WireframeParams {
    /// Set the ribbon width.
    #[must_use]
    pub const fn with_width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    /// Set the ridge height.
    #[must_use]
    pub const fn with_height_center(mut self, height: f32) -> Self {
        self.height_center = height;
        self
    }

    /// Set the side height.
    #[must_use]
    pub const fn with_height_side(mut self, height: f32) -> Self {
        self.height_side = height;
        self
    }
}

impl MeshAggregate {
    /// Replace every triangle of a polygroup by ribbons along its edges.
    ///
    /// Per triangle nine vertices are emitted: the three corners (outer),
    /// the corners of [`border_triangle`](mesh_buffers::TriangleView::border_triangle)
    /// (inner), and a ridge point halfway between each outer and inner pair.
    /// Outer and inner points are lifted by `height_side` along the face
    /// normal, ridge points by a further `height_center`. Each edge gets two
    /// quads, so a triangle yields twelve. Copies of corner `k` provide the
    /// non-position channels of its outer, ridge and inner points; normals are
    /// recomputed at the end.
    ///
    /// The result is a new aggregate with this one's attribute set holding
    /// polygroup `target_id`.
    ///
    /// # Errors
    ///
    /// - [`MeshError::UnknownPolygroup`] if `id` does not exist;
    /// - [`MeshError::IllegalArgument`] if `width` is negative or not finite.
    pub fn wireframe(
        &self,
        id: &PolyGroupId,
        target_id: PolyGroupId,
        params: &WireframeParams,
    ) -> MeshResult<Self> {
        if !params.width.is_finite() || params.width < 0.0 {
            return Err(MeshError::IllegalArgument(format!(
                "wireframe width must be finite and non-negative, got {}",
                params.width
            )));
        }

        let triangles = self.triangle_views(id)?;
        let mut vertices = Vec::with_capacity(triangles.len() * 9);
        let mut faces = Vec::with_capacity(triangles.len() * 12);

        for t in &triangles {
            let n = t.face_normal();
            let side = n * params.height_side;
            let outer = t.positions().map(|p| p + side);
            let inner = t.border_triangle(params.width).map(|p| p + side);
            let ridge: [Point3<f32>; 3] = std::array::from_fn(|k| {
                Point3::from((outer[k].coords + inner[k].coords) * 0.5) + n * params.height_center
            });

            let base = to_u32(vertices.len())?;
            for ring in [&outer, &ridge, &inner] {
                for (k, &p) in ring.iter().enumerate() {
                    let Vertex {
                        normal,
                        uv,
                        color,
                        attributes,
                        ..
                    } = t.vertex(k).to_vertex();
                    vertices.push(Vertex {
                        position: p,
                        normal,
                        uv,
                        color,
                        attributes,
                    });
                }
            }

            for k in 0..3u32 {
                let k1 = (k + 1) % 3;
                let (o0, o1) = (base + k, base + k1);
                let (r0, r1) = (base + 3 + k, base + 3 + k1);
                let (i0, i1) = (base + 6 + k, base + 6 + k1);
                faces.extend([[o0, o1, r1], [o0, r1, r0], [r0, r1, i1], [r0, i1, i0]]);
            }
        }

        debug!(
            "Wireframe of {} into {}: {} triangles -> {}",
            id,
            target_id,
            triangles.len(),
            faces.len()
        );
        let mut out = Self::with_attributes(self.attributes())?;
        out.add_new_polygroup(&vertices, &faces, target_id.clone())?;
        out.recalculate_normals(&target_id)?;
        Ok(out)
    }
}
