//! Renderable per-face surfaces keyed by [`FaceId`].
//!
//! Each [`SelectableFaceSurface`] owns a world-space copy of its face's
//! triangles, independent of the source mesh's buffers, plus the display
//! color the selection layer assigns to it.

mod color;
mod pick;

pub use color::Color;
pub use pick::PickHit;

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::math::transform::transform_point;
use crate::math::{Aabb, Point3, Vector3};
use crate::mesh::{compute_vertex_normals, Mesh};
use crate::reconstruct::{FaceId, ReconstructedFace};

/// World-space geometry and display state of one reconstructed face.
#[derive(Debug, Clone)]
pub struct SelectableFaceSurface {
    id: FaceId,
    positions: Vec<Point3>,
    normals: Vec<Vector3>,
    area: f64,
    color: Color,
    opacity: f32,
}

impl SelectableFaceSurface {
    /// Resolves `face`'s triangles through `mesh`'s transform.
    ///
    /// Shading normals are recomputed from the resolved geometry by averaging
    /// the normals of the face's triangles around each shared vertex; the
    /// mesh's own normal buffer is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the face references triangles missing from `mesh`.
    pub fn materialize(face: &ReconstructedFace, mesh: &Mesh) -> Result<Self> {
        let transform = mesh.transform();

        let mut local_of: HashMap<u32, u32> = HashMap::new();
        let mut world = Vec::new();
        let mut triangles = Vec::with_capacity(face.triangles.len());
        for &t in &face.triangles {
            let tri = mesh.triangle_indices(t)?;
            triangles.push(tri.map(|v| {
                *local_of.entry(v).or_insert_with(|| {
                    world.push(transform_point(transform, &mesh.vertices()[v as usize]));
                    local_index(world.len() - 1)
                })
            }));
        }
        let vertex_normals = compute_vertex_normals(&world, &triangles);

        let mut positions = Vec::with_capacity(triangles.len() * 3);
        let mut normals = Vec::with_capacity(triangles.len() * 3);
        for tri in &triangles {
            for &v in tri {
                positions.push(world[v as usize]);
                normals.push(vertex_normals[v as usize]);
            }
        }

        let area = positions
            .chunks_exact(3)
            .map(|c| crate::math::triangle::triangle_area(&[c[0], c[1], c[2]]))
            .sum();

        Ok(Self {
            id: face.id,
            positions,
            normals,
            area,
            color: Color::DEFAULT_FACE,
            opacity: 1.0,
        })
    }

    /// Identifier of the face this surface renders.
    #[must_use]
    pub fn id(&self) -> FaceId {
        self.id
    }

    /// Non-indexed world-space positions, three per triangle.
    #[must_use]
    pub fn positions(&self) -> &[Point3] {
        &self.positions
    }

    /// Shading normals, one per position.
    #[must_use]
    pub fn normals(&self) -> &[Vector3] {
        &self.normals
    }

    /// World-space triangles.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3; 3]> + '_ {
        self.positions.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// World-space surface area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Current display color.
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Current display opacity in `[0, 1]`.
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub(crate) fn set_display(&mut self, color: Color, opacity: f32) {
        self.color = color;
        self.opacity = opacity;
    }
}

#[allow(clippy::cast_possible_truncation)]
fn local_index(i: usize) -> u32 {
    i as u32
}

/// Lookup table of materialized surfaces, iterated in [`FaceId`] order.
#[derive(Debug, Default)]
pub struct FaceGeometryStore {
    surfaces: BTreeMap<FaceId, SelectableFaceSurface>,
}

impl FaceGeometryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Materializes `face` and registers it under its id, replacing any
    /// previous surface with that id.
    ///
    /// # Errors
    ///
    /// Returns an error if the face does not fit `mesh`.
    pub fn materialize(&mut self, face: &ReconstructedFace, mesh: &Mesh) -> Result<&SelectableFaceSurface> {
        let surface = SelectableFaceSurface::materialize(face, mesh)?;
        debug!(face = %face.id, triangles = surface.triangle_count(), "surface materialized");
        let slot = match self.surfaces.entry(face.id) {
            Entry::Occupied(mut occupied) => {
                occupied.insert(surface);
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert(surface),
        };
        Ok(slot)
    }

    /// Materializes every face of one mesh.
    ///
    /// Either all faces are registered or, on error, none are.
    ///
    /// # Errors
    ///
    /// Returns an error if any face does not fit `mesh`.
    #[instrument(skip_all, fields(faces = faces.len()))]
    pub fn load(&mut self, faces: &[ReconstructedFace], mesh: &Mesh) -> Result<usize> {
        let surfaces = faces
            .iter()
            .map(|face| SelectableFaceSurface::materialize(face, mesh))
            .collect::<Result<Vec<_>>>()?;
        let count = surfaces.len();
        for surface in surfaces {
            self.surfaces.insert(surface.id, surface);
        }
        info!(count, total = self.surfaces.len(), "surfaces loaded");
        Ok(count)
    }

    /// Moves every surface of `other` into this store, replacing equal ids.
    pub fn absorb(&mut self, mut other: FaceGeometryStore) {
        self.surfaces.append(&mut other.surfaces);
    }

    /// Removes every surface belonging to `mesh_index`, returning their ids.
    pub fn remove_mesh(&mut self, mesh_index: u32) -> Vec<FaceId> {
        let removed: Vec<FaceId> = self
            .surfaces
            .range(FaceId::new(mesh_index, 0)..=FaceId::new(mesh_index, u32::MAX))
            .map(|(id, _)| *id)
            .collect();
        for id in &removed {
            self.surfaces.remove(id);
        }
        removed
    }

    /// Removes all surfaces.
    pub fn clear(&mut self) {
        self.surfaces.clear();
    }

    /// Surface registered under `id`.
    #[must_use]
    pub fn get(&self, id: FaceId) -> Option<&SelectableFaceSurface> {
        self.surfaces.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: FaceId) -> Option<&mut SelectableFaceSurface> {
        self.surfaces.get_mut(&id)
    }

    /// Whether a surface is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: FaceId) -> bool {
        self.surfaces.contains_key(&id)
    }

    /// All surfaces in id order.
    pub fn iter(&self) -> impl Iterator<Item = &SelectableFaceSurface> {
        self.surfaces.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut SelectableFaceSurface> {
        self.surfaces.values_mut()
    }

    /// World-space bounds of every registered surface, or `None` when empty.
    #[must_use]
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.surfaces.values().flat_map(|s| s.positions.iter()))
    }

    /// Number of registered surfaces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Matrix4;
    use crate::reconstruct::{ReconstructFaces, ReconstructionParams};
    use approx::assert_relative_eq;

    fn folded() -> (Mesh, Vec<ReconstructedFace>) {
        let mesh = crate::reconstruct::tests::folded_squares();
        let faces = ReconstructFaces::new(0, ReconstructionParams::default())
            .execute(&mesh)
            .unwrap();
        (mesh, faces)
    }

    #[test]
    fn surface_is_self_contained() {
        let (mesh, faces) = folded();
        let surface = SelectableFaceSurface::materialize(&faces[0], &mesh).unwrap();
        assert_eq!(surface.triangle_count(), 2);
        assert_eq!(surface.positions().len(), 6);
        assert_eq!(surface.normals().len(), 6);
        assert_relative_eq!(surface.area(), 1.0, epsilon = 1e-12);
        assert!(surface.normals().iter().all(|n| (n - Vector3::z()).norm() < 1e-12));
        assert_eq!(surface.color(), Color::DEFAULT_FACE);
    }

    #[test]
    fn transform_is_applied() {
        let (mesh, faces) = folded();
        let mesh = mesh.with_transform(Matrix4::new_scaling(2.0));
        let surface = SelectableFaceSurface::materialize(&faces[0], &mesh).unwrap();
        assert_relative_eq!(surface.area(), 4.0, epsilon = 1e-12);
        assert_relative_eq!(surface.positions()[2], Point3::new(2.0, 2.0, 0.0));
    }

    #[test]
    fn normals_ignore_source_buffer() {
        let (mesh, faces) = folded();
        let flipped = Mesh::from_buffers(
            &mesh.vertices().iter().flat_map(|p| [p.x, p.y, p.z]).collect::<Vec<_>>(),
            &mesh.indices().iter().flatten().copied().collect::<Vec<_>>(),
            Some([0.0, 0.0, -1.0].repeat(mesh.vertex_count()).as_slice()),
        )
        .unwrap();
        let surface = SelectableFaceSurface::materialize(&faces[0], &flipped).unwrap();
        assert_relative_eq!(surface.normals()[0], Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn store_registers_and_removes_by_mesh() {
        let (mesh, faces) = folded();
        let mut store = FaceGeometryStore::new();
        assert_eq!(store.load(&faces, &mesh).unwrap(), 2);

        let other = ReconstructFaces::new(1, ReconstructionParams::default())
            .execute(&mesh)
            .unwrap();
        store.materialize(&other[0], &mesh).unwrap();
        assert_eq!(store.len(), 3);
        assert!(store.contains(FaceId::new(1, 0)));

        let removed = store.remove_mesh(0);
        assert_eq!(removed, vec![FaceId::new(0, 0), FaceId::new(0, 1)]);
        assert_eq!(store.len(), 1);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn bounds_cover_all_surfaces() {
        let (mesh, faces) = folded();
        let mut store = FaceGeometryStore::new();
        assert!(store.bounds().is_none());

        store.load(&faces, &mesh).unwrap();
        let bounds = store.bounds().unwrap();
        assert_relative_eq!(bounds.min, Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(bounds.max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn failed_load_registers_nothing() {
        let (mesh, mut faces) = folded();
        faces[1].triangles.push(99);
        let mut store = FaceGeometryStore::new();
        assert!(store.load(&faces, &mesh).is_err());
        assert!(store.is_empty());
    }
}
