use std::collections::HashMap;

use super::Mesh;

/// An undirected mesh edge, stored with the smaller vertex index first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge(pub u32, pub u32);

impl Edge {
    /// Creates an edge from two vertex indices in either order.
    #[must_use]
    pub fn new(a: u32, b: u32) -> Self {
        if a < b {
            Edge(a, b)
        } else {
            Edge(b, a)
        }
    }

    /// The three edges of a triangle.
    #[must_use]
    pub fn of_triangle(tri: [u32; 3]) -> [Edge; 3] {
        [
            Edge::new(tri[0], tri[1]),
            Edge::new(tri[1], tri[2]),
            Edge::new(tri[2], tri[0]),
        ]
    }
}

/// Edge-to-triangle incidence for a subset of a mesh's triangles.
#[derive(Debug, Clone, Default)]
pub struct EdgeAdjacency {
    incident: HashMap<Edge, Vec<usize>>,
}

impl EdgeAdjacency {
    /// Builds incidence over every triangle of `mesh`.
    #[must_use]
    pub fn build(mesh: &Mesh) -> Self {
        Self::build_subset(mesh, 0..mesh.triangle_count())
    }

    /// Builds incidence over the given triangle indices only.
    ///
    /// Indices outside the mesh are ignored.
    #[must_use]
    pub fn build_subset(mesh: &Mesh, triangles: impl IntoIterator<Item = usize>) -> Self {
        let mut incident: HashMap<Edge, Vec<usize>> = HashMap::new();
        for t in triangles {
            let Some(&tri) = mesh.indices().get(t) else {
                continue;
            };
            for edge in Edge::of_triangle(tri) {
                incident.entry(edge).or_default().push(t);
            }
        }
        Self { incident }
    }

    /// Triangles incident to `edge`.
    #[must_use]
    pub fn triangles_of(&self, edge: Edge) -> &[usize] {
        self.incident.get(&edge).map(Vec::as_slice).unwrap_or_default()
    }

    /// Triangles sharing an edge with triangle `t` (excluding `t` itself).
    #[must_use]
    pub fn neighbors(&self, mesh: &Mesh, t: usize) -> Vec<usize> {
        let Some(&tri) = mesh.indices().get(t) else {
            return Vec::new();
        };
        let mut out: Vec<usize> = Edge::of_triangle(tri)
            .iter()
            .flat_map(|e| self.triangles_of(*e))
            .copied()
            .filter(|&n| n != t)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Edges with exactly one incident triangle, sorted.
    #[must_use]
    pub fn boundary_edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .incident
            .iter()
            .filter(|(_, tris)| tris.len() == 1)
            .map(|(e, _)| *e)
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.incident.len()
    }
}
