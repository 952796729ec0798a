//! Per-polygroup connectivity.
//!
//! All queries use group-local vertex and triangle indices.

use hashbrown::{HashMap, HashSet};

use crate::aggregate::{MeshAggregate, Polygroup};
use crate::error::{MeshError, MeshResult};
use crate::id::PolyGroupId;

/// Map from store vertex index to group-local index.
pub(crate) fn local_lookup(group: &Polygroup) -> HashMap<u32, usize> {
    group
        .vertices
        .iter()
        .enumerate()
        .map(|(local, &global)| (global, local))
        .collect()
}

/// Connectivity of one polygroup, built once and queried many times.
///
/// Triangles are stored with local corner indices. The structure is a
/// snapshot: it does not follow later edits of the aggregate.
#[derive(Debug, Clone)]
pub struct GroupTopology {
    /// Local corner indices per local triangle.
    triangles: Vec<[usize; 3]>,
    /// Local triangles incident to each local vertex.
    vertex_triangles: Vec<Vec<usize>>,
    /// Local triangles incident to each undirected edge `(min, max)`.
    edge_triangles: HashMap<(usize, usize), Vec<usize>>,
}

impl GroupTopology {
    /// Build the topology of a polygroup.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist, and
    /// [`MeshError::IllegalArgument`] if a triangle uses a vertex outside
    /// the group.
    pub fn build(mesh: &MeshAggregate, id: &PolyGroupId) -> MeshResult<Self> {
        let group = mesh.polygroup(id)?;
        let local = local_lookup(group);

        let mut triangles = Vec::with_capacity(group.triangles.len());
        for &slot in &group.triangles {
            let face = mesh.store.face_indices(slot as usize)?;
            let mut corners = [0usize; 3];
            for (corner, v) in corners.iter_mut().zip(face) {
                *corner = *local.get(&v).ok_or_else(|| {
                    MeshError::IllegalArgument(format!(
                        "triangle {slot} of polygroup {id} uses vertex {v} outside the group"
                    ))
                })?;
            }
            triangles.push(corners);
        }

        Ok(Self::from_triangles(group.vertices.len(), triangles))
    }

    /// Build the topology of a locally indexed triangle list.
    ///
    /// Corners must be below `vertex_count`.
    #[must_use]
    pub fn from_triangles(vertex_count: usize, triangles: Vec<[usize; 3]>) -> Self {
        let mut vertex_triangles = vec![Vec::new(); vertex_count];
        let mut edge_triangles: HashMap<(usize, usize), Vec<usize>> = HashMap::new();

        for (t, tri) in triangles.iter().enumerate() {
            for k in 0..3 {
                if let Some(list) = vertex_triangles.get_mut(tri[k]) {
                    list.push(t);
                }
                let edge = normalize_edge(tri[k], tri[(k + 1) % 3]);
                edge_triangles.entry(edge).or_default().push(t);
            }
        }

        Self {
            triangles,
            vertex_triangles,
            edge_triangles,
        }
    }

    /// Number of local vertices.
    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_triangles.len()
    }

    /// Number of local triangles.
    #[inline]
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Local corners of a triangle.
    #[must_use]
    pub fn triangle(&self, t: usize) -> Option<[usize; 3]> {
        self.triangles.get(t).copied()
    }

    /// All triangles with local corners.
    #[must_use]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Triangles containing vertex `i`.
    #[must_use]
    pub fn parent_triangles(&self, i: usize) -> &[usize] {
        self.vertex_triangles.get(i).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Triangles sharing the undirected edge `{a, b}`.
    #[must_use]
    pub fn edge_triangles(&self, a: usize, b: usize) -> &[usize] {
        self.edge_triangles
            .get(&normalize_edge(a, b))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Vertices sharing at least one triangle with `i`, ascending and
    /// without duplicates.
    #[must_use]
    pub fn neighbours(&self, i: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self
            .parent_triangles(i)
            .iter()
            .flat_map(|&t| self.triangles[t])
            .filter(|&v| v != i)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Directed link edges of `i`: for each incident triangle rotated so that
    /// `i` comes first, the pair of the other two corners in winding order.
    fn link_edges(&self, i: usize) -> Vec<(usize, usize)> {
        self.parent_triangles(i)
            .iter()
            .filter_map(|&t| {
                let tri = self.triangles[t];
                let k = tri.iter().position(|&v| v == i)?;
                Some((tri[(k + 1) % 3], tri[(k + 2) % 3]))
            })
            .collect()
    }

    /// Neighbours of `i` ordered by walking its triangle fan.
    ///
    /// For an interior vertex the walk is a closed loop; for a boundary
    /// vertex it starts at one end of the open fan. The direction follows
    /// the winding of the incident triangles. Neighbours a non-manifold fan
    /// leaves unreached are appended in ascending order.
    #[must_use]
    pub fn neighbours_sorted(&self, i: usize) -> Vec<usize> {
        let links = self.link_edges(i);
        let Some(&(first, _)) = links.first() else {
            return Vec::new();
        };

        let mut adjacency: HashMap<usize, Vec<usize>> = HashMap::new();
        let mut incoming: HashMap<usize, usize> = HashMap::new();
        for &(a, b) in &links {
            adjacency.entry(a).or_default().push(b);
            adjacency.entry(b).or_default().push(a);
            *incoming.entry(b).or_default() += 1;
            incoming.entry(a).or_default();
        }

        // Open fans start where no link edge arrives.
        let mut starts: Vec<usize> = adjacency
            .iter()
            .filter(|(v, n)| n.len() == 1 && incoming.get(*v).copied() == Some(0))
            .map(|(v, _)| *v)
            .collect();
        starts.sort_unstable();
        let start = starts.first().copied().unwrap_or(first);

        let successors: HashMap<usize, usize> = links.iter().copied().collect();
        let mut order = vec![start];
        let mut visited: HashSet<usize> = HashSet::new();
        visited.insert(start);
        let mut current = start;
        loop {
            let preferred = successors.get(&current).copied().filter(|n| !visited.contains(n));
            let next = preferred.or_else(|| {
                adjacency
                    .get(&current)
                    .and_then(|ns| ns.iter().copied().filter(|n| !visited.contains(n)).min())
            });
            let Some(next) = next else { break };
            visited.insert(next);
            order.push(next);
            current = next;
        }

        let mut rest: Vec<usize> = adjacency
            .keys()
            .copied()
            .filter(|v| !visited.contains(v))
            .collect();
        rest.sort_unstable();
        order.extend(rest);
        order
    }

    /// Check whether the triangle fan around `i` closes into a single loop.
    ///
    /// True exactly for interior vertices of a manifold mesh. Boundary,
    /// isolated and non-manifold vertices report `false`.
    #[must_use]
    pub fn has_complete_neighbourhood(&self, i: usize) -> bool {
        let links = self.link_edges(i);
        if links.len() < 3 {
            return false;
        }
        let mut adjacency: HashMap<usize, Vec<usize>> = HashMap::new();
        for &(a, b) in &links {
            adjacency.entry(a).or_default().push(b);
            adjacency.entry(b).or_default().push(a);
        }
        if adjacency.values().any(|n| n.len() != 2) {
            return false;
        }

        // Every link vertex has degree two; the fan is closed iff the link is
        // one cycle rather than several.
        let start = links[0].0;
        let mut previous = start;
        let mut current = links[0].1;
        let mut steps = 1;
        while current != start {
            let Some(ns) = adjacency.get(&current) else {
                return false;
            };
            let next = if ns[0] == previous { ns[1] } else { ns[0] };
            previous = current;
            current = next;
            steps += 1;
            if steps > adjacency.len() {
                return false;
            }
        }
        steps == adjacency.len()
    }

    /// Undirected edges used by exactly one triangle.
    #[must_use]
    pub fn boundary_edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = self
            .edge_triangles
            .iter()
            .filter(|(_, faces)| faces.len() == 1)
            .map(|(edge, _)| *edge)
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Triangles sharing an edge with triangle `t`.
    #[must_use]
    pub fn adjacent_triangles(&self, t: usize) -> Vec<usize> {
        let Some(tri) = self.triangle(t) else {
            return Vec::new();
        };
        let mut out: Vec<usize> = (0..3)
            .flat_map(|k| self.edge_triangles(tri[k], tri[(k + 1) % 3]).iter().copied())
            .filter(|&other| other != t)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// Normalize edge to have smaller index first.
#[inline]
pub(crate) const fn normalize_edge(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl MeshAggregate {
    /// Build the reusable topology of a polygroup.
    ///
    /// Building costs one pass over the group's triangles. Callers that
    /// query many vertices should build it once and use the
    /// [`GroupTopology`] accessors rather than the single-vertex wrappers
    /// below, each of which rebuilds it.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] if `id` does not exist.
    pub fn topology(&self, id: &PolyGroupId) -> MeshResult<GroupTopology> {
        GroupTopology::build(self, id)
    }

    fn check_local(&self, id: &PolyGroupId, i: usize) -> MeshResult<()> {
        let len = self.vertex_count(id)?;
        if i >= len {
            return Err(MeshError::LocalIndexOutOfBounds {
                id: id.clone(),
                index: i,
                len,
            });
        }
        Ok(())
    }

    /// Local vertices sharing a triangle with local vertex `i`.
    ///
    /// Builds a fresh [`GroupTopology`] per call, so looping over every
    /// vertex costs `O(V·T)`. For bulk queries use
    /// [`topology`](Self::topology) once and [`GroupTopology::neighbours`].
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] or
    /// [`MeshError::LocalIndexOutOfBounds`].
    pub fn find_vertex_neighbours(&self, id: &PolyGroupId, i: usize) -> MeshResult<Vec<usize>> {
        self.check_local(id, i)?;
        Ok(self.topology(id)?.neighbours(i))
    }

    /// Neighbours of local vertex `i` in fan order.
    ///
    /// Rebuilds the topology per call; see
    /// [`find_vertex_neighbours`](Self::find_vertex_neighbours).
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] or
    /// [`MeshError::LocalIndexOutOfBounds`].
    pub fn find_neighbours_sorted(&self, id: &PolyGroupId, i: usize) -> MeshResult<Vec<usize>> {
        self.check_local(id, i)?;
        Ok(self.topology(id)?.neighbours_sorted(i))
    }

    /// Check whether the fan around local vertex `i` is closed.
    ///
    /// Rebuilds the topology per call; see
    /// [`find_vertex_neighbours`](Self::find_vertex_neighbours).
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] or
    /// [`MeshError::LocalIndexOutOfBounds`].
    pub fn check_if_has_complete_neighbourhood(&self, id: &PolyGroupId, i: usize) -> MeshResult<bool> {
        self.check_local(id, i)?;
        Ok(self.topology(id)?.has_complete_neighbourhood(i))
    }

    /// Local triangles containing local vertex `i`.
    ///
    /// Rebuilds the topology per call; see
    /// [`find_vertex_neighbours`](Self::find_vertex_neighbours).
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownPolygroup`] or
    /// [`MeshError::LocalIndexOutOfBounds`].
    pub fn find_vertex_parent_triangles(&self, id: &PolyGroupId, i: usize) -> MeshResult<Vec<usize>> {
        self.check_local(id, i)?;
        Ok(self.topology(id)?.parent_triangles(i).to_vec())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Square split into four triangles around a centre vertex 4.
    fn fan() -> GroupTopology {
        GroupTopology::from_triangles(
            5,
            vec![[0, 1, 4], [1, 2, 4], [2, 3, 4], [3, 0, 4]],
        )
    }

    #[test]
    fn neighbours_deduplicated() {
        let topo = fan();
        assert_eq!(topo.neighbours(4), vec![0, 1, 2, 3]);
        assert_eq!(topo.neighbours(0), vec![1, 3, 4]);
        assert_eq!(topo.parent_triangles(0), &[0, 3]);
    }

    #[test]
    fn centre_fan_is_complete_and_ordered() {
        let topo = fan();
        assert!(topo.has_complete_neighbourhood(4));
        let sorted = topo.neighbours_sorted(4);
        assert_eq!(sorted.len(), 4);
        // Consecutive entries share a triangle with the centre.
        for k in 0..4 {
            let a = sorted[k];
            let b = sorted[(k + 1) % 4];
            assert_eq!(topo.edge_triangles(a, b).len(), 1, "{a}-{b}");
        }
        assert_eq!(sorted, vec![0, 1, 2, 3]);
    }

    #[test]
    fn boundary_vertex_fan_is_open() {
        let topo = fan();
        assert!(!topo.has_complete_neighbourhood(0));
        // Link of 0: (1,4) from t0 and (4,3) from t3, so the open walk is 1 -> 4 -> 3.
        assert_eq!(topo.neighbours_sorted(0), vec![1, 4, 3]);
    }

    #[test]
    fn isolated_vertex_has_no_neighbours() {
        let topo = GroupTopology::from_triangles(4, vec![[0, 1, 2]]);
        assert!(topo.neighbours(3).is_empty());
        assert!(topo.neighbours_sorted(3).is_empty());
        assert!(!topo.has_complete_neighbourhood(3));
    }

    #[test]
    fn two_disjoint_fans_are_not_complete() {
        // Vertex 0 is the pinch point of two closed fans.
        let topo = GroupTopology::from_triangles(
            7,
            vec![[0, 1, 2], [0, 2, 3], [0, 3, 1], [0, 4, 5], [0, 5, 6], [0, 6, 4]],
        );
        assert!(!topo.has_complete_neighbourhood(0));
        assert_eq!(topo.neighbours_sorted(0).len(), 6);
    }

    #[test]
    fn boundary_edges_of_fan() {
        let topo = fan();
        assert_eq!(topo.boundary_edges(), vec![(0, 1), (0, 3), (1, 2), (2, 3)]);
        assert_eq!(topo.adjacent_triangles(0), vec![1, 3]);
    }

    #[test]
    fn single_vertex_queries_match_prebuilt_topology() {
        use mesh_buffers::Vertex;

        let vertices: Vec<Vertex> = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.5, 0.5]]
            .into_iter()
            .map(|[x, y]| Vertex::from_coords(x, y, 0.0))
            .collect();
        let id = PolyGroupId::from(0);
        let mesh = MeshAggregate::from_polygroup(
            &vertices,
            &[[0, 1, 4], [1, 2, 4], [2, 3, 4], [3, 0, 4]],
            id.clone(),
        )
        .unwrap();

        let topo = mesh.topology(&id).unwrap();
        for i in 0..5 {
            assert_eq!(mesh.find_vertex_neighbours(&id, i).unwrap(), topo.neighbours(i));
            assert_eq!(mesh.find_neighbours_sorted(&id, i).unwrap(), topo.neighbours_sorted(i));
            assert_eq!(
                mesh.check_if_has_complete_neighbourhood(&id, i).unwrap(),
                topo.has_complete_neighbourhood(i)
            );
            assert_eq!(
                mesh.find_vertex_parent_triangles(&id, i).unwrap(),
                topo.parent_triangles(i)
            );
        }
        assert!(topo.has_complete_neighbourhood(4));
        assert!(matches!(
            mesh.find_vertex_neighbours(&id, 5),
            Err(MeshError::LocalIndexOutOfBounds { index: 5, .. })
        ));
    }
}
