//! Barycentric and edge-midpoint subdivision of a polygroup.
//!
//! Both schemes return a new aggregate with the input's attribute set and a
//! single polygroup under the input id. Inserted vertices blend every
//! active channel of their parents (see [`Vertex::blend`]).

use hashbrown::HashMap;
use mesh_buffers::Vertex;
use tracing::debug;

use crate::aggregate::{to_u32, MeshAggregate};
use crate::error::MeshResult;
use crate::id::PolyGroupId;
use crate::topology::normalize_edge;

const THIRD: f32 = 1.0 / 3.0;

impl MeshAggregate {
    /// Split every triangle at its centroid into three.
    ///
    /// Triangle `(a, b, c)` with centroid `m` becomes `(a, b, m)`,
    /// `(b, c, m)` and `(c, a, m)`, so winding is kept.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`](crate::MeshError::UnknownPolygroup)
    /// if `id` does not exist.
    pub fn subdivide_barycentric(&self, id: &PolyGroupId) -> MeshResult<Self> {
        let mut vertices = self.vertices(id)?;
        let faces = self.indices(id)?;
        let mut new_faces = Vec::with_capacity(faces.len() * 3);
        vertices.reserve(faces.len());

        for &[a, b, c] in &faces {
            let centroid = Vertex::blend(&[
                (&vertices[a as usize], THIRD),
                (&vertices[b as usize], THIRD),
                (&vertices[c as usize], THIRD),
            ]);
            let m = to_u32(vertices.len())?;
            vertices.push(centroid);
            new_faces.extend([[a, b, m], [b, c, m], [c, a, m]]);
        }

        debug!(
            "Barycentric subdivision of {}: {} -> {} triangles",
            id,
            faces.len(),
            new_faces.len()
        );
        let mut out = Self::with_attributes(self.attributes())?;
        out.add_new_polygroup(&vertices, &new_faces, id.clone())?;
        Ok(out)
    }

    /// Split every triangle into four at its edge midpoints.
    ///
    /// Midpoints are shared between triangles on either side of an edge.
    /// Triangle `(a, b, c)` becomes the three corner triangles
    /// `(a, ab, ca)`, `(ab, b, bc)`, `(ca, bc, c)` and the centre `(ab, bc, ca)`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`](crate::MeshError::UnknownPolygroup)
    /// if `id` does not exist.
    pub fn subdivide_edgecentric(&self, id: &PolyGroupId) -> MeshResult<Self> {
        let mut vertices = self.vertices(id)?;
        let faces = self.indices(id)?;
        let mut new_faces = Vec::with_capacity(faces.len() * 4);
        let mut midpoints: HashMap<(usize, usize), u32> = HashMap::new();

        for &[a, b, c] in &faces {
            let ab = midpoint(&mut vertices, &mut midpoints, a, b)?;
            let bc = midpoint(&mut vertices, &mut midpoints, b, c)?;
            let ca = midpoint(&mut vertices, &mut midpoints, c, a)?;
            new_faces.extend([[a, ab, ca], [ab, b, bc], [ca, bc, c], [ab, bc, ca]]);
        }

        debug!(
            "Edge subdivision of {}: {} -> {} triangles, {} midpoints",
            id,
            faces.len(),
            new_faces.len(),
            midpoints.len()
        );
        let mut out = Self::with_attributes(self.attributes())?;
        out.add_new_polygroup(&vertices, &new_faces, id.clone())?;
        Ok(out)
    }
}

fn midpoint(
    vertices: &mut Vec<Vertex>,
    midpoints: &mut HashMap<(usize, usize), u32>,
    a: u32,
    b: u32,
) -> MeshResult<u32> {
    let edge = normalize_edge(a as usize, b as usize);
    if let Some(&m) = midpoints.get(&edge) {
        return Ok(m);
    }
    let mid = Vertex::blend(&[(&vertices[edge.0], 0.5), (&vertices[edge.1], 0.5)]);
    let m = to_u32(vertices.len())?;
    vertices.push(mid);
    midpoints.insert(edge, m);
    Ok(m)
}
