use crate::math::triangle::{triangle_cross, try_normalize};
use crate::math::{fallback_normal, Point3, Vector3};

/// Computes per-vertex normals by averaging the unit normals of the
/// triangles incident to each vertex.
///
/// Vertices touched only by degenerate triangles (or by none) get `+Z`.
#[must_use]
pub fn compute_vertex_normals(vertices: &[Point3], triangles: &[[u32; 3]]) -> Vec<Vector3> {
    let mut sums = vec![Vector3::zeros(); vertices.len()];

    for tri in triangles {
        let corners = tri.map(|i| vertices[i as usize]);
        let Some(normal) = try_normalize(&triangle_cross(&corners)) else {
            continue;
        };
        for &i in tri {
            sums[i as usize] += normal;
        }
    }

    sums.iter()
        .map(|n| try_normalize(n).unwrap_or_else(fallback_normal))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn shared_vertex_averages_normals() {
        // Two triangles folded 90 degrees along the x axis.
        let vertices = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let triangles = [[0, 1, 2], [0, 3, 1]];
        let normals = compute_vertex_normals(&vertices, &triangles);

        assert_relative_eq!(normals[2], Vector3::z());
        assert_relative_eq!(normals[3], Vector3::y());
        let diag = Vector3::new(0.0, 1.0, 1.0).normalize();
        assert_relative_eq!(normals[0], diag, epsilon = 1e-12);
        assert_relative_eq!(normals[1], diag, epsilon = 1e-12);
    }

    #[test]
    fn isolated_vertex_gets_fallback() {
        let vertices = [Point3::origin(); 4];
        let normals = compute_vertex_normals(&vertices, &[[0, 1, 2]]);
        assert!(normals.iter().all(|n| *n == Vector3::z()));
    }
}
