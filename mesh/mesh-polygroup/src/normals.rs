//! Vertex normal estimation and face orientation.

use std::collections::VecDeque;

use mesh_buffers::{Point3, Vector3};
use tracing::{debug, info};

use crate::aggregate::MeshAggregate;
use crate::error::MeshResult;
use crate::id::PolyGroupId;
use crate::topology::GroupTopology;

/// Average of the unit face normals around local vertex `i`.
///
/// `None` when the vertex has no incident triangles.
fn averaged_normal(
    positions: &[Point3<f32>],
    topology: &GroupTopology,
    i: usize,
) -> Option<Vector3<f32>> {
    let faces = topology.parent_triangles(i);
    if faces.is_empty() {
        return None;
    }
    let mut sum = Vector3::zeros();
    for &t in faces {
        let [a, b, c] = topology.triangles()[t].map(|v| positions[v]);
        let n = (b - a).cross(&(c - a));
        sum += n / n.norm();
    }
    let mean = sum / faces.len() as f32;
    Some(mean.try_normalize(0.0).unwrap_or(mean))
}

impl MeshAggregate {
    /// Recompute the normal of local vertex `i` from its incident faces.
    ///
    /// A vertex without incident triangles keeps its normal.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`](crate::MeshError::UnknownPolygroup)
    /// or [`MeshError::LocalIndexOutOfBounds`](crate::MeshError::LocalIndexOutOfBounds).
    pub fn recalculate_normal(&mut self, id: &PolyGroupId, i: usize) -> MeshResult<()> {
        let global = self.global_vertex_index(id, i)?;
        let topology = self.topology(id)?;
        let positions = self.group_positions(id)?;
        if let Some(n) = averaged_normal(&positions, &topology, i) {
            self.store.set_normal(global, n)?;
        }
        Ok(())
    }

    /// Recompute the normals of local vertex `i` and its 1-ring.
    ///
    /// # Errors
    ///
    /// Same as [`recalculate_normal`](Self::recalculate_normal).
    pub fn recalculate_normals_nearby(&mut self, id: &PolyGroupId, i: usize) -> MeshResult<()> {
        self.global_vertex_index(id, i)?;
        let topology = self.topology(id)?;
        let globals = self.group_vertices(id)?;
        let mut scope = topology.neighbours(i);
        scope.push(i);
        self.write_normals(&topology, &globals, &scope)
    }

    /// Recompute every vertex normal of a polygroup.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`](crate::MeshError::UnknownPolygroup)
    /// if `id` does not exist.
    pub fn recalculate_normals(&mut self, id: &PolyGroupId) -> MeshResult<()> {
        let topology = self.topology(id)?;
        let globals = self.group_vertices(id)?;
        let scope: Vec<usize> = (0..globals.len()).collect();
        self.write_normals(&topology, &globals, &scope)?;
        debug!("Recalculated {} normals in polygroup {}", globals.len(), id);
        Ok(())
    }

    /// Recompute every vertex normal of every polygroup.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`recalculate_normals`](Self::recalculate_normals).
    pub fn recalculate_all_normals(&mut self) -> MeshResult<()> {
        for id in self.ids() {
            self.recalculate_normals(&id)?;
        }
        Ok(())
    }

    fn write_normals(
        &mut self,
        topology: &GroupTopology,
        globals: &[usize],
        scope: &[usize],
    ) -> MeshResult<()> {
        let positions = globals
            .iter()
            .map(|&g| self.store.position(g))
            .collect::<Result<Vec<_>, _>>()?;
        let normals: Vec<(usize, Vector3<f32>)> = scope
            .iter()
            .filter_map(|&i| averaged_normal(&positions, topology, i).map(|n| (globals[i], n)))
            .collect();
        for (global, n) in normals {
            self.store.set_normal(global, n)?;
        }
        Ok(())
    }

    /// Make the winding of a polygroup consistent across shared edges.
    ///
    /// Each connected component is walked breadth-first from its lowest
    /// triangle, which keeps its winding. A neighbour that traverses a
    /// shared edge in the same direction as its already oriented neighbour
    /// is flipped. Returns the number of flipped triangles.
    ///
    /// Non-orientable components (such as a Möbius strip) cannot be made
    /// consistent; the result is then the winding the walk reached.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`](crate::MeshError::UnknownPolygroup)
    /// if `id` does not exist.
    pub fn orient_faces(&mut self, id: &PolyGroupId) -> MeshResult<usize> {
        let topology = self.topology(id)?;
        let slots = self.group_triangles(id)?;

        let mut oriented: Vec<[usize; 3]> = topology.triangles().to_vec();
        let mut flipped = vec![false; oriented.len()];
        let mut visited = vec![false; oriented.len()];
        let mut components = 0usize;

        for seed in 0..oriented.len() {
            if visited[seed] {
                continue;
            }
            components += 1;
            visited[seed] = true;
            let mut queue = VecDeque::from([seed]);

            while let Some(f) = queue.pop_front() {
                let tri = oriented[f];
                for k in 0..3 {
                    let (u, v) = (tri[k], tri[(k + 1) % 3]);
                    for &g in topology.edge_triangles(u, v) {
                        if g == f || visited[g] {
                            continue;
                        }
                        visited[g] = true;
                        if has_directed_edge(oriented[g], u, v) {
                            let [a, b, c] = oriented[g];
                            oriented[g] = [c, b, a];
                            flipped[g] = true;
                        }
                        queue.push_back(g);
                    }
                }
            }
        }

        let mut count = 0;
        for (local, &was_flipped) in flipped.iter().enumerate() {
            if was_flipped {
                self.store.triangle_view_mut(slots[local])?.change_orientation();
                count += 1;
            }
        }
        info!(
            "Oriented polygroup {}: {} components, {} triangles flipped",
            id, components, count
        );
        Ok(count)
    }

    /// Orient every polygroup. Returns the total number of flipped triangles.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`orient_faces`](Self::orient_faces).
    pub fn orient_all_faces(&mut self) -> MeshResult<usize> {
        let mut total = 0;
        for id in self.ids() {
            total += self.orient_faces(&id)?;
        }
        Ok(total)
    }

    /// Negate every vertex normal of a polygroup and reverse its winding.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`](crate::MeshError::UnknownPolygroup)
    /// if `id` does not exist.
    pub fn flip_normals(&mut self, id: &PolyGroupId) -> MeshResult<()> {
        for v in self.group_vertices(id)? {
            let n = self.store.normal(v)?;
            self.store.set_normal(v, -n)?;
        }
        for t in self.group_triangles(id)? {
            self.store.triangle_view_mut(t)?.change_orientation();
        }
        Ok(())
    }

    /// [`flip_normals`](Self::flip_normals) on every polygroup.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`flip_normals`](Self::flip_normals).
    pub fn flip_all_normals(&mut self) -> MeshResult<()> {
        for id in self.ids() {
            self.flip_normals(&id)?;
        }
        Ok(())
    }

    /// Make normals and windings of a polygroup face along `direction`.
    ///
    /// Vertex normals with a negative component along `direction` are
    /// negated, and triangles whose face normal opposes it are flipped.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`](crate::MeshError::UnknownPolygroup)
    /// if `id` does not exist.
    pub fn point_normals_in_direction(
        &mut self,
        direction: &Vector3<f32>,
        id: &PolyGroupId,
    ) -> MeshResult<()> {
        for v in self.group_vertices(id)? {
            let n = self.store.normal(v)?;
            if n.dot(direction) < 0.0 {
                self.store.set_normal(v, -n)?;
            }
        }
        for t in self.group_triangles(id)? {
            if self.store.triangle_view(t)?.cross().dot(direction) < 0.0 {
                self.store.triangle_view_mut(t)?.change_orientation();
            }
        }
        Ok(())
    }

    /// [`point_normals_in_direction`](Self::point_normals_in_direction) on
    /// every polygroup.
    ///
    /// # Errors
    ///
    /// Propagates errors from the per-group call.
    pub fn point_all_normals_in_direction(&mut self, direction: &Vector3<f32>) -> MeshResult<()> {
        for id in self.ids() {
            self.point_normals_in_direction(direction, &id)?;
        }
        Ok(())
    }
}

fn has_directed_edge(tri: [usize; 3], u: usize, v: usize) -> bool {
    (0..3).any(|k| tri[k] == u && tri[(k + 1) % 3] == v)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mesh_buffers::Vertex;

    fn id() -> PolyGroupId {
        PolyGroupId::from("quad")
    }

    fn quad(faces: &[[u32; 3]]) -> MeshAggregate {
        let vertices: Vec<Vertex> = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
        ]
        .into_iter()
        .map(Vertex::from)
        .collect();
        MeshAggregate::from_polygroup(&vertices, faces, id()).unwrap()
    }

    fn shares_edge_oppositely(mesh: &MeshAggregate, a: u32, b: u32) -> bool {
        let t0 = mesh.triangle_view(&id(), 0).unwrap();
        let t1 = mesh.triangle_view(&id(), 1).unwrap();
        (t0.has_directed_edge(a, b) && t1.has_directed_edge(b, a))
            || (t0.has_directed_edge(b, a) && t1.has_directed_edge(a, b))
    }

    #[test]
    fn orient_fixes_opposite_windings() {
        let mut mesh = quad(&[[0, 1, 2], [0, 2, 3]]);
        assert!(shares_edge_oppositely(&mesh, 0, 2));
        assert_eq!(mesh.orient_faces(&id()).unwrap(), 0);

        let mut mesh = quad(&[[0, 1, 2], [0, 3, 2]]);
        assert!(!shares_edge_oppositely(&mesh, 0, 2));
        assert_eq!(mesh.orient_faces(&id()).unwrap(), 1);
        assert!(shares_edge_oppositely(&mesh, 0, 2));
        let n0 = mesh.triangle_view(&id(), 0).unwrap().face_normal();
        let n1 = mesh.triangle_view(&id(), 1).unwrap().face_normal();
        assert_relative_eq!(n0, n1);
    }

    #[test]
    fn orient_handles_every_component() {
        let vertices: Vec<Vertex> = (0..8)
            .map(|k| Vertex::from_coords(k as f32, (k % 2) as f32, 0.0))
            .collect();
        // Two separate strips, each with one inconsistent triangle.
        let faces = [[0, 1, 2], [1, 2, 3], [4, 5, 6], [5, 6, 7]];
        let mut mesh = MeshAggregate::from_polygroup(&vertices, &faces, id()).unwrap();
        let flipped = mesh.orient_faces(&id()).unwrap();
        assert_eq!(flipped, 2);
    }

    #[test]
    fn recalculated_normals_follow_winding() {
        let mut mesh = quad(&[[0, 1, 2], [0, 2, 3]]);
        mesh.recalculate_normals(&id()).unwrap();
        for v in mesh.vertex_views(&id()).unwrap() {
            assert_relative_eq!(v.normal(), Vector3::z(), epsilon = 1e-6);
        }
    }

    #[test]
    fn recalculate_nearby_touches_ring_only() {
        let mut mesh = quad(&[[0, 1, 2]]);
        mesh.recalculate_normals_nearby(&id(), 0).unwrap();
        assert_relative_eq!(mesh.vertex_view(&id(), 2).unwrap().normal(), Vector3::z());
        // Vertex 3 has no triangles and keeps its zero normal.
        assert_eq!(mesh.vertex_view(&id(), 3).unwrap().normal(), Vector3::zeros());
    }

    #[test]
    fn flip_normals_twice_is_identity() {
        let mut mesh = quad(&[[0, 1, 2], [0, 2, 3]]);
        mesh.recalculate_normals(&id()).unwrap();
        let before = mesh.indices(&id()).unwrap();
        let normals: Vec<_> = mesh.vertices(&id()).unwrap().iter().map(|v| v.normal).collect();

        mesh.flip_normals(&id()).unwrap();
        assert_eq!(
            mesh.triangle_view(&id(), 0).unwrap().face_normal(),
            -Vector3::z()
        );
        assert_eq!(mesh.vertex_view(&id(), 0).unwrap().normal(), -Vector3::z());

        mesh.flip_normals(&id()).unwrap();
        assert_eq!(mesh.indices(&id()).unwrap(), before);
        let after: Vec<_> = mesh.vertices(&id()).unwrap().iter().map(|v| v.normal).collect();
        assert_eq!(after, normals);
    }

    #[test]
    fn point_normals_in_direction_flips_both() {
        let mut mesh = quad(&[[0, 1, 2], [0, 3, 2]]);
        mesh.recalculate_normals(&id()).unwrap();
        mesh.point_normals_in_direction(&Vector3::z(), &id()).unwrap();
        for t in mesh.triangle_views(&id()).unwrap() {
            assert!(t.face_normal().z > 0.0);
        }
        for v in mesh.vertex_views(&id()).unwrap() {
            assert!(v.normal().z >= 0.0);
        }
    }
}
