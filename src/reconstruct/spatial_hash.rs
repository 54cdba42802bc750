use std::collections::HashMap;

use crate::math::Point3;

use super::{ClusterStrategy, ReconstructionParams, TriangleSample};

type Cell = (i64, i64, i64);

/// Grid-accelerated clustering.
///
/// Centroids are bucketed into cubic cells whose edge equals the distance
/// threshold, so every accepted candidate lies in one of the 27 cells around
/// the seed. Candidates are still tested in ascending order against the seed
/// alone, which keeps the clusters identical to [`GreedyScan`](super::GreedyScan).
#[derive(Debug, Clone, Copy, Default)]
pub struct SpatialHashScan;

impl ClusterStrategy for SpatialHashScan {
    fn name(&self) -> &'static str {
        "spatial_hash"
    }

    fn cluster(&self, samples: &[TriangleSample], params: &ReconstructionParams) -> Vec<Vec<usize>> {
        let cell_size = params.distance_threshold;
        let mut grid: HashMap<Cell, Vec<usize>> = HashMap::new();
        for (t, sample) in samples.iter().enumerate() {
            grid.entry(cell_of(&sample.centroid, cell_size))
                .or_default()
                .push(t);
        }

        let mut processed = vec![false; samples.len()];
        let mut clusters = Vec::new();
        let mut candidates = Vec::new();

        for seed in 0..samples.len() {
            if processed[seed] {
                continue;
            }
            processed[seed] = true;
            let reference = samples[seed];

            candidates.clear();
            let (cx, cy, cz) = cell_of(&reference.centroid, cell_size);
            for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        let key = (cx.saturating_add(dx), cy.saturating_add(dy), cz.saturating_add(dz));
                        if let Some(bucket) = grid.get(&key) {
                            candidates.extend(bucket.iter().copied().filter(|&t| t > seed && !processed[t]));
                        }
                    }
                }
            }
            candidates.sort_unstable();

            let mut members = vec![seed];
            for &candidate in &candidates {
                if reference.accepts(&samples[candidate], params) {
                    processed[candidate] = true;
                    members.push(candidate);
                }
            }
            clusters.push(members);
        }

        clusters
    }
}

#[allow(clippy::cast_possible_truncation)]
fn cell_of(p: &Point3, size: f64) -> Cell {
    // `as` saturates for out-of-range floats
    (
        (p.x / size).floor() as i64,
        (p.y / size).floor() as i64,
        (p.z / size).floor() as i64,
    )
}
