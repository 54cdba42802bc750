//! Property-based tests for reconstruction and selection invariants.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use facemap::mesh::Mesh;
use facemap::reconstruct::{
    FaceId, GreedyScan, ReconstructFaces, ReconstructionParams, SpatialHashScan,
};
use facemap::selection::{GroupDefinition, SelectionManager};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// Arbitrary triangle soup: up to 40 triangles with small integer-ish coords
/// so that normals coincide often enough to form multi-triangle clusters.
fn arb_mesh() -> impl Strategy<Value = Mesh> {
    prop::collection::vec(
        prop::array::uniform9(-4i32..4).prop_map(|c| c.map(f64::from)),
        1..40,
    )
    .prop_map(|tris| {
        let vertices: Vec<f64> = tris.iter().flatten().copied().collect();
        #[allow(clippy::cast_possible_truncation)]
        let indices: Vec<u32> = (0..tris.len() as u32 * 3).collect();
        Mesh::from_buffers(&vertices, &indices, None).unwrap()
    })
}

fn arb_params() -> impl Strategy<Value = ReconstructionParams> {
    (0.5f64..1.0, 0.5f64..12.0).prop_map(|(normal_threshold, distance_threshold)| {
        ReconstructionParams {
            normal_threshold,
            distance_threshold,
            ..ReconstructionParams::default()
        }
    })
}

#[derive(Debug, Clone)]
enum Op {
    Assign(u32, usize),
    Toggle(u32, usize),
    Unassign(u32),
    ClearGroup(usize),
    ClearAll,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..12, 0usize..5).prop_map(|(f, g)| Op::Assign(f, g)),
        (0u32..12, 0usize..5).prop_map(|(f, g)| Op::Toggle(f, g)),
        (0u32..12).prop_map(Op::Unassign),
        (0usize..5).prop_map(Op::ClearGroup),
        Just(Op::ClearAll),
    ]
}

fn labels() -> Vec<String> {
    GroupDefinition::defaults()
        .into_iter()
        .map(|d| d.label.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Reconstruction
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn every_triangle_in_exactly_one_face(mesh in arb_mesh(), params in arb_params()) {
        let faces = ReconstructFaces::new(0, params).execute(&mesh).unwrap();
        let mut seen = vec![0usize; mesh.triangle_count()];
        for face in &faces {
            prop_assert!(!face.triangles.is_empty());
            for &t in &face.triangles {
                seen[t] += 1;
            }
        }
        prop_assert!(seen.iter().all(|&c| c == 1), "coverage: {:?}", seen);
    }

    #[test]
    fn reconstruction_is_deterministic(mesh in arb_mesh(), params in arb_params()) {
        let op = ReconstructFaces::new(0, params);
        let a: Vec<_> = op.execute(&mesh).unwrap().into_iter().map(|f| f.triangles).collect();
        let b: Vec<_> = op.execute(&mesh).unwrap().into_iter().map(|f| f.triangles).collect();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn spatial_hash_matches_greedy(mesh in arb_mesh(), params in arb_params()) {
        let op = ReconstructFaces::new(0, params);
        let a: Vec<_> = op.execute_with(&mesh, &GreedyScan).unwrap().into_iter().map(|f| f.triangles).collect();
        let b: Vec<_> = op.execute_with(&mesh, &SpatialHashScan).unwrap().into_iter().map(|f| f.triangles).collect();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn face_area_is_sum_of_triangle_areas(mesh in arb_mesh()) {
        let faces = ReconstructFaces::new(0, ReconstructionParams::default()).execute(&mesh).unwrap();
        let total: f64 = faces.iter().map(|f| f.area).sum();
        let expected: f64 = (0..mesh.triangle_count()).map(|t| mesh.area(t).unwrap()).sum();
        prop_assert!((total - expected).abs() < 1e-9 * expected.max(1.0));
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn index_stays_consistent(ops in prop::collection::vec(arb_op(), 0..60)) {
        let labels = labels();
        let mut m = SelectionManager::with_groups(GroupDefinition::defaults()).unwrap();
        for op in ops {
            match op {
                Op::Assign(f, g) => { m.assign(FaceId::new(0, f), &labels[g]).unwrap(); }
                Op::Toggle(f, g) => { m.toggle_select(FaceId::new(0, f), &labels[g]).unwrap(); }
                Op::Unassign(f) => { m.unassign(FaceId::new(0, f)); }
                Op::ClearGroup(g) => { m.clear_group(&labels[g]).unwrap(); }
                Op::ClearAll => { m.clear_all(); }
            }
            prop_assert!(m.check_invariants().is_ok());
            let total: usize = m.groups().map(|g| g.len()).sum();
            prop_assert_eq!(total, m.assigned_count());
        }
    }

    #[test]
    fn toggle_twice_restores_state(
        setup in prop::collection::vec((0u32..8, 0usize..5), 0..10),
        face in 0u32..8,
        group in 0usize..5,
    ) {
        let labels = labels();
        let mut m = SelectionManager::with_groups(GroupDefinition::defaults()).unwrap();
        for (f, g) in setup {
            m.assign(FaceId::new(0, f), &labels[g]).unwrap();
        }
        let face = FaceId::new(0, face);
        let before = m.group_of(face).cloned();

        m.toggle_select(face, &labels[group]).unwrap();
        m.toggle_select(face, &labels[group]).unwrap();

        // a face that started in another group ends up in the toggle group
        match before {
            None => prop_assert!(m.group_of(face).is_none()),
            Some(ref g) if g.as_str() == labels[group] => prop_assert_eq!(m.group_of(face), Some(g)),
            Some(_) => prop_assert_eq!(m.group_of(face).map(|g| g.as_str()), Some(labels[group].as_str())),
        }
    }
}
