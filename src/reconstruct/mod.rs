//! Recovers the CAD face partition of a tessellated mesh.
//!
//! Triangles are clustered greedily: each unprocessed triangle, in ascending
//! index order, seeds a cluster and claims every later unprocessed triangle
//! whose normal is within `normal_threshold` (cosine) of the seed normal and
//! whose centroid lies closer than `distance_threshold` to the seed centroid.
//!
//! This is an approximation. It is O(n²) with [`GreedyScan`], depends on
//! triangle order, and can under- or over-merge faces near the thresholds.
//! [`SpatialHashScan`] removes most of the quadratic cost but yields exactly
//! the same clusters.

mod face;
mod greedy;
mod spatial_hash;

pub use face::{FaceId, ReconstructedFace};
pub use greedy::GreedyScan;
pub use spatial_hash::SpatialHashScan;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{ClusterError, ConfigError, Result};
use crate::math::{fallback_normal, Point3, Vector3};
use crate::mesh::{Mesh, NormalSource};

/// Cosine of roughly 18 degrees.
pub const DEFAULT_NORMAL_THRESHOLD: f64 = 0.95;

/// Default centroid distance, in model units.
pub const DEFAULT_DISTANCE_THRESHOLD: f64 = 10.0;

/// Positions closer than this are the same vertex.
pub const DEFAULT_VERTEX_MERGE_TOLERANCE: f64 = 1e-3;

/// Parameters controlling face reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionParams {
    /// Minimum dot product between a candidate normal and the seed normal.
    pub normal_threshold: f64,
    /// Centroid distance to the seed must be strictly below this value.
    pub distance_threshold: f64,
    /// Tolerance used when deduplicating face vertices.
    pub vertex_merge_tolerance: f64,
    /// Where triangle normals come from.
    pub normal_source: NormalSource,
    /// Candidate lookup used while clustering.
    pub method: ClusterMethod,
}

impl Default for ReconstructionParams {
    fn default() -> Self {
        Self {
            normal_threshold: DEFAULT_NORMAL_THRESHOLD,
            distance_threshold: DEFAULT_DISTANCE_THRESHOLD,
            vertex_merge_tolerance: DEFAULT_VERTEX_MERGE_TOLERANCE,
            normal_source: NormalSource::Geometric,
            method: ClusterMethod::Greedy,
        }
    }
}

impl ReconstructionParams {
    /// Checks that every threshold is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !(self.normal_threshold > 0.0 && self.normal_threshold <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "normal_threshold",
                reason: format!("{} is outside (0, 1]", self.normal_threshold),
            });
        }
        if !(self.distance_threshold > 0.0 && self.distance_threshold.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "distance_threshold",
                reason: format!("{} must be positive and finite", self.distance_threshold),
            });
        }
        if !(self.vertex_merge_tolerance > 0.0 && self.vertex_merge_tolerance.is_finite()) {
            return Err(ConfigError::InvalidValue {
                field: "vertex_merge_tolerance",
                reason: format!("{} must be positive and finite", self.vertex_merge_tolerance),
            });
        }
        Ok(())
    }
}

/// Selects a [`ClusterStrategy`] from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterMethod {
    /// Linear scan over all later triangles.
    #[default]
    Greedy,
    /// Grid-bucketed candidate lookup.
    SpatialHash,
}

impl ClusterMethod {
    /// The strategy implementing this method.
    #[must_use]
    pub fn strategy(self) -> &'static dyn ClusterStrategy {
        match self {
            ClusterMethod::Greedy => &GreedyScan,
            ClusterMethod::SpatialHash => &SpatialHashScan,
        }
    }
}

/// Per-triangle reference values used by the clustering predicate.
#[derive(Debug, Clone, Copy)]
pub struct TriangleSample {
    /// Unit normal (fallback `+Z` when degenerate).
    pub normal: Vector3,
    /// Triangle centroid.
    pub centroid: Point3,
}

impl TriangleSample {
    /// Whether `candidate` joins a cluster seeded by `self`.
    #[must_use]
    pub fn accepts(&self, candidate: &TriangleSample, params: &ReconstructionParams) -> bool {
        self.normal.dot(&candidate.normal) >= params.normal_threshold
            && (candidate.centroid - self.centroid).norm() < params.distance_threshold
    }
}

/// Partitions triangles into clusters.
///
/// Implementations must return clusters in seed order (ascending first
/// triangle), each with ascending member indices, and must reproduce the
/// greedy precedence: a triangle belongs to the lowest-indexed seed that
/// accepts it and was not itself claimed earlier.
pub trait ClusterStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Clusters `samples` (indexed by triangle) under `params`.
    fn cluster(&self, samples: &[TriangleSample], params: &ReconstructionParams) -> Vec<Vec<usize>>;
}

/// Reconstructs the faces of one mesh.
pub struct ReconstructFaces {
    mesh_index: u32,
    params: ReconstructionParams,
}

impl ReconstructFaces {
    /// Creates a new `ReconstructFaces` operation for the mesh at `mesh_index`.
    #[must_use]
    pub fn new(mesh_index: u32, params: ReconstructionParams) -> Self {
        Self { mesh_index, params }
    }

    /// Executes the reconstruction with the strategy named in the params.
    ///
    /// # Errors
    ///
    /// Returns an error if the params are invalid.
    pub fn execute(&self, mesh: &Mesh) -> Result<Vec<ReconstructedFace>> {
        self.execute_with(mesh, self.params.method.strategy())
    }

    /// Executes the reconstruction with an explicit clustering strategy.
    ///
    /// Every triangle of `mesh` ends up in exactly one returned face. Faces
    /// are numbered in discovery order.
    ///
    /// # Errors
    ///
    /// Returns an error if the params are invalid, or a [`ClusterError`] if
    /// `strategy` does not return a partition of the triangles into non-empty
    /// clusters.
    #[instrument(skip_all, fields(mesh = self.mesh_index, strategy = strategy.name()))]
    pub fn execute_with(
        &self,
        mesh: &Mesh,
        strategy: &dyn ClusterStrategy,
    ) -> Result<Vec<ReconstructedFace>> {
        self.params.validate()?;

        let (samples, degenerate) = sample_triangles(mesh, self.params.normal_source)?;
        if degenerate > 0 {
            warn!(degenerate, "degenerate triangles given fallback normal");
        }

        let clusters = strategy.cluster(&samples, &self.params);
        check_partition(&clusters, samples.len())?;

        let mut faces = Vec::with_capacity(clusters.len());
        for (ordinal, members) in clusters.into_iter().enumerate() {
            let id = FaceId::new(self.mesh_index, ordinal_u32(ordinal));
            let face = ReconstructedFace::build(id, mesh, &samples, members, &self.params)?;
            debug!(face = %face.id, triangles = face.triangles.len(), area = face.area, "face built");
            faces.push(face);
        }

        info!(
            triangles = mesh.triangle_count(),
            faces = faces.len(),
            "reconstructed faces"
        );
        Ok(faces)
    }
}

/// Every triangle in exactly one non-empty cluster.
fn check_partition(clusters: &[Vec<usize>], triangle_count: usize) -> std::result::Result<(), ClusterError> {
    let mut seen = vec![false; triangle_count];
    for (cluster, members) in clusters.iter().enumerate() {
        if members.is_empty() {
            return Err(ClusterError::EmptyCluster(cluster));
        }
        for &triangle in members {
            let slot = seen.get_mut(triangle).ok_or(ClusterError::TriangleOutOfRange {
                cluster,
                triangle,
                triangle_count,
            })?;
            if std::mem::replace(slot, true) {
                return Err(ClusterError::DuplicateTriangle(triangle));
            }
        }
    }
    match seen.iter().position(|claimed| !claimed) {
        Some(triangle) => Err(ClusterError::MissingTriangle(triangle)),
        None => Ok(()),
    }
}

/// Computes the normal and centroid of every triangle once.
///
/// Returns the samples and the number of degenerate triangles.
fn sample_triangles(mesh: &Mesh, source: NormalSource) -> Result<(Vec<TriangleSample>, usize)> {
    let mut degenerate = 0;
    let mut samples = Vec::with_capacity(mesh.triangle_count());
    for t in 0..mesh.triangle_count() {
        let normal = if let Some(n) = mesh.try_normal(t, source)? {
            n
        } else {
            degenerate += 1;
            fallback_normal()
        };
        samples.push(TriangleSample {
            normal,
            centroid: mesh.centroid(t)?,
        });
    }
    Ok((samples, degenerate))
}

#[allow(clippy::cast_possible_truncation)]
fn ordinal_u32(ordinal: usize) -> u32 {
    ordinal.min(u32::MAX as usize) as u32
}
