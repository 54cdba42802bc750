use super::{ClusterStrategy, ReconstructionParams, TriangleSample};

/// Reference clustering: every seed scans all later triangles.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyScan;

impl ClusterStrategy for GreedyScan {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn cluster(&self, samples: &[TriangleSample], params: &ReconstructionParams) -> Vec<Vec<usize>> {
        let mut processed = vec![false; samples.len()];
        let mut clusters = Vec::new();

        for seed in 0..samples.len() {
            if processed[seed] {
                continue;
            }
            processed[seed] = true;
            let reference = samples[seed];

            let mut members = vec![seed];
            for candidate in (seed + 1)..samples.len() {
                if !processed[candidate] && reference.accepts(&samples[candidate], params) {
                    processed[candidate] = true;
                    members.push(candidate);
                }
            }
            clusters.push(members);
        }

        clusters
    }
}
