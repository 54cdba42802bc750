//! Flat triangle meshes as delivered by the upstream tessellator.
//!
//! A [`Mesh`] owns validated vertex/index/normal buffers plus the transform
//! that places it in world space. Triangles are never stored on their own;
//! they are addressed by their position in the index buffer.

mod adjacency;
mod normals;

pub use adjacency::{Edge, EdgeAdjacency};
pub use normals::compute_vertex_normals;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::MeshError;
use crate::math::transform::transform_point;
use crate::math::triangle::{triangle_area, triangle_centroid, try_normalize, try_triangle_normal};
use crate::math::{fallback_normal, Matrix4, Point3, Vector3};

/// Where per-triangle normals are taken from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalSource {
    /// Cross product of the triangle's edges.
    #[default]
    Geometric,
    /// Average of the three vertex normals from the normal buffer, falling
    /// back to the geometric normal when the mesh carries no normals.
    VertexBuffer,
}

/// A validated, flat triangle mesh.
#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<Point3>,
    indices: Vec<[u32; 3]>,
    normals: Option<Vec<Vector3>>,
    transform: Matrix4,
}

impl Mesh {
    /// Builds a mesh from flat buffers (`xyz` triplets and index triplets).
    ///
    /// # Errors
    ///
    /// Returns a [`MeshError`] if the vertex buffer is empty, a buffer length
    /// is not a multiple of 3, an index references a missing vertex, the
    /// normal buffer does not match the vertex buffer, or any coordinate is
    /// not finite.
    #[instrument(skip_all, fields(vertices = vertices.len() / 3, indices = indices.len()))]
    pub fn from_buffers(
        vertices: &[f64],
        indices: &[u32],
        normals: Option<&[f64]>,
    ) -> Result<Self, MeshError> {
        if vertices.is_empty() {
            return Err(MeshError::EmptyVertices);
        }
        if vertices.len() % 3 != 0 {
            return Err(MeshError::VertexBufferLength(vertices.len()));
        }
        if indices.len() % 3 != 0 {
            return Err(MeshError::IndexBufferLength(indices.len()));
        }
        if let Some(pos) = vertices.iter().position(|c| !c.is_finite()) {
            return Err(MeshError::NonFinite(pos));
        }

        let vertex_count = vertices.len() / 3;
        if let Some((position, &index)) = indices
            .iter()
            .enumerate()
            .find(|&(_, &i)| i as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                position,
                index,
                vertex_count,
            });
        }

        let normals = match normals {
            Some(n) if n.len() != vertices.len() => {
                return Err(MeshError::NormalBufferLength {
                    normals: n.len(),
                    vertices: vertices.len(),
                });
            }
            Some(n) => {
                if let Some(pos) = n.iter().position(|c| !c.is_finite()) {
                    return Err(MeshError::NonFinite(pos));
                }
                Some(
                    n.chunks_exact(3)
                        .map(|c| Vector3::new(c[0], c[1], c[2]))
                        .collect(),
                )
            }
            None => None,
        };

        let mesh = Self {
            vertices: vertices
                .chunks_exact(3)
                .map(|c| Point3::new(c[0], c[1], c[2]))
                .collect(),
            indices: indices
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect(),
            normals,
            transform: Matrix4::identity(),
        };
        debug!(triangles = mesh.triangle_count(), "mesh validated");
        Ok(mesh)
    }

    /// Builds a mesh from structured vertices and triangles.
    ///
    /// # Errors
    ///
    /// Same validation as [`Mesh::from_buffers`].
    pub fn from_triangles(vertices: &[Point3], triangles: &[[u32; 3]]) -> Result<Self, MeshError> {
        let flat_vertices: Vec<f64> = vertices.iter().flat_map(|p| [p.x, p.y, p.z]).collect();
        let flat_indices: Vec<u32> = triangles.iter().flatten().copied().collect();
        Self::from_buffers(&flat_vertices, &flat_indices, None)
    }

    /// Sets the local-to-world transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Matrix4) -> Self {
        self.transform = transform;
        self
    }

    /// Replaces the normal buffer with normals recomputed from geometry.
    #[must_use]
    pub fn with_computed_normals(mut self) -> Self {
        self.normals = Some(compute_vertex_normals(&self.vertices, &self.indices));
        self
    }

    /// Local-to-world transform.
    #[must_use]
    pub fn transform(&self) -> &Matrix4 {
        &self.transform
    }

    /// Vertex positions in local space.
    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Triangle index triplets.
    #[must_use]
    pub fn indices(&self) -> &[[u32; 3]] {
        &self.indices
    }

    /// Per-vertex normals, if the mesh carries them.
    #[must_use]
    pub fn normals(&self) -> Option<&[Vector3]> {
        self.normals.as_deref()
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    /// Vertex indices of triangle `t`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::TriangleNotFound`] if `t` is out of range.
    pub fn triangle_indices(&self, t: usize) -> Result<[u32; 3], MeshError> {
        self.indices
            .get(t)
            .copied()
            .ok_or(MeshError::TriangleNotFound(t))
    }

    /// Local-space corner positions of triangle `t`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::TriangleNotFound`] if `t` is out of range.
    pub fn triangle(&self, t: usize) -> Result<[Point3; 3], MeshError> {
        let [a, b, c] = self.triangle_indices(t)?;
        Ok([
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ])
    }

    /// World-space corner positions of triangle `t`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::TriangleNotFound`] if `t` is out of range.
    pub fn world_triangle(&self, t: usize) -> Result<[Point3; 3], MeshError> {
        let tri = self.triangle(t)?;
        Ok(tri.map(|p| transform_point(&self.transform, &p)))
    }

    /// Centroid of triangle `t`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::TriangleNotFound`] if `t` is out of range.
    pub fn centroid(&self, t: usize) -> Result<Point3, MeshError> {
        Ok(triangle_centroid(&self.triangle(t)?))
    }

    /// Area of triangle `t`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::TriangleNotFound`] if `t` is out of range.
    pub fn area(&self, t: usize) -> Result<f64, MeshError> {
        Ok(triangle_area(&self.triangle(t)?))
    }

    /// Unit normal of triangle `t`, or `Ok(None)` when it is degenerate.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::TriangleNotFound`] if `t` is out of range.
    pub fn try_normal(&self, t: usize, source: NormalSource) -> Result<Option<Vector3>, MeshError> {
        let tri = self.triangle(t)?;
        if let (NormalSource::VertexBuffer, Some(normals)) = (source, &self.normals) {
            let [a, b, c] = self.indices[t];
            let sum = normals[a as usize] + normals[b as usize] + normals[c as usize];
            if let Some(n) = try_normalize(&sum) {
                return Ok(Some(n));
            }
        }
        Ok(try_triangle_normal(&tri))
    }

    /// Unit normal of triangle `t`, substituting `+Z` for degenerate triangles.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::TriangleNotFound`] if `t` is out of range.
    pub fn normal(&self, t: usize, source: NormalSource) -> Result<Vector3, MeshError> {
        Ok(self.try_normal(t, source)?.unwrap_or_else(fallback_normal))
    }
}
