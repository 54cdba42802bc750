use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::math::{Aabb, Point3, Vector3};
use crate::mesh::{Edge, EdgeAdjacency, Mesh};

use super::{ReconstructionParams, TriangleSample};

/// Stable identifier of a reconstructed face.
///
/// Compared and hashed structurally; the `Display` form is for logs and
/// metadata only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FaceId {
    /// Index of the source mesh within the session.
    pub mesh_index: u32,
    /// Discovery order of the face within its mesh.
    pub ordinal: u32,
}

impl FaceId {
    /// Creates a new face id.
    #[must_use]
    pub fn new(mesh_index: u32, ordinal: u32) -> Self {
        Self {
            mesh_index,
            ordinal,
        }
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face_{}_{}", self.mesh_index, self.ordinal)
    }
}

/// A cluster of mesh triangles inferred to be one CAD face.
///
/// All geometry is in the source mesh's local space.
#[derive(Debug, Clone)]
pub struct ReconstructedFace {
    /// Stable identifier.
    pub id: FaceId,
    /// Member triangle indices, ascending.
    pub triangles: Vec<usize>,
    /// Distinct member vertex positions (tolerance-welded).
    pub vertices: Vec<Point3>,
    /// Normal of the seed triangle.
    pub normal: Vector3,
    /// Mean of the member triangle centroids.
    pub centroid: Point3,
    /// Componentwise bounds of all member vertices.
    pub bounds: Aabb,
    /// Sum of member triangle areas.
    pub area: f64,
    /// Edges used by exactly one member triangle.
    pub boundary_edges: Vec<Edge>,
}

impl ReconstructedFace {
    /// Builds the face record for one finished cluster.
    ///
    /// `members` must be non-empty with the seed first.
    pub(crate) fn build(
        id: FaceId,
        mesh: &Mesh,
        samples: &[TriangleSample],
        members: Vec<usize>,
        params: &ReconstructionParams,
    ) -> Result<Self> {
        let seed = members[0];
        let normal = samples[seed].normal;

        let mut welder = VertexWelder::new(params.vertex_merge_tolerance);
        let mut area = 0.0;
        let mut centroid_sum = Vector3::zeros();
        let mut bounds = Aabb::from_point(mesh.triangle(seed)?[0]);

        for &t in &members {
            let tri = mesh.triangle(t)?;
            area += mesh.area(t)?;
            centroid_sum += samples[t].centroid.coords;
            for p in &tri {
                bounds.expand(p);
                welder.insert(*p);
            }
        }

        #[allow(clippy::cast_precision_loss)]
        let centroid = Point3::from(centroid_sum / members.len() as f64);
        let boundary_edges = EdgeAdjacency::build_subset(mesh, members.iter().copied()).boundary_edges();

        Ok(Self {
            id,
            triangles: members,
            vertices: welder.into_points(),
            normal,
            centroid,
            bounds,
            area,
            boundary_edges,
        })
    }

    /// Number of member triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Number of distinct vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

/// Merges positions closer than a tolerance, keeping the first seen.
struct VertexWelder {
    tolerance: f64,
    points: Vec<Point3>,
    grid: HashMap<(i64, i64, i64), Vec<usize>>,
}

impl VertexWelder {
    fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            points: Vec::new(),
            grid: HashMap::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell(&self, p: &Point3) -> (i64, i64, i64) {
        (
            (p.x / self.tolerance).floor() as i64,
            (p.y / self.tolerance).floor() as i64,
            (p.z / self.tolerance).floor() as i64,
        )
    }

    fn insert(&mut self, p: Point3) {
        let (cx, cy, cz) = self.cell(&p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let key = (cx.saturating_add(dx), cy.saturating_add(dy), cz.saturating_add(dz));
                    if let Some(bucket) = self.grid.get(&key) {
                        if bucket
                            .iter()
                            .any(|&i| (self.points[i] - p).norm() < self.tolerance)
                        {
                            return;
                        }
                    }
                }
            }
        }
        self.grid.entry((cx, cy, cz)).or_default().push(self.points.len());
        self.points.push(p);
    }

    fn into_points(self) -> Vec<Point3> {
        self.points
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn display_is_readable() {
        assert_eq!(FaceId::new(2, 17).to_string(), "face_2_17");
    }

    #[test]
    fn ids_order_by_mesh_then_ordinal() {
        assert!(FaceId::new(0, 9) < FaceId::new(1, 0));
        assert!(FaceId::new(1, 0) < FaceId::new(1, 1));
    }

    #[test]
    fn welder_merges_within_tolerance() {
        let mut welder = VertexWelder::new(1e-3);
        welder.insert(Point3::new(0.0, 0.0, 0.0));
        welder.insert(Point3::new(0.0004, 0.0, 0.0));
        welder.insert(Point3::new(-0.0004, 0.0003, 0.0));
        welder.insert(Point3::new(0.002, 0.0, 0.0));
        let points = welder.into_points();
        assert_eq!(points.len(), 2);
        assert_relative_eq!(points[1], Point3::new(0.002, 0.0, 0.0));
    }

    #[test]
    fn face_record_of_folded_floor() {
        let mesh = super::super::tests::folded_squares();
        let faces = super::super::ReconstructFaces::new(3, ReconstructionParams::default())
            .execute(&mesh)
            .unwrap();
        let floor = &faces[0];

        assert_eq!(floor.id, FaceId::new(3, 0));
        assert_eq!(floor.triangle_count(), 2);
        assert_eq!(floor.vertex_count(), 4);
        assert_relative_eq!(floor.centroid, Point3::new(0.5, 0.5, 0.0), epsilon = 1e-12);
        assert_eq!(floor.bounds.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(floor.bounds.max, Point3::new(1.0, 1.0, 0.0));
        // the shared diagonal is interior
        assert_eq!(floor.boundary_edges.len(), 4);
        assert!(!floor.boundary_edges.contains(&Edge::new(0, 2)));
    }
}
