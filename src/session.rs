//! One user's editing session: loaded meshes, their faces, and selection.
//!
//! All mutation goes through `&mut self`, so each call is atomic with respect
//! to the selection invariants.

use std::collections::BTreeMap;

use tracing::{info, instrument};

use crate::config::SessionConfig;
use crate::error::{MeshError, Result, SelectionError};
use crate::export::{ExportEnclosure, ExportGroup, ExportGroups, ExportReport, ExportedSurface};
use crate::math::intersect_3d::Ray;
use crate::mesh::Mesh;
use crate::reconstruct::{FaceId, ReconstructFaces, ReconstructedFace};
use crate::selection::{
    apply_command, CommandOutcome, GroupLabel, GroupSummary, SelectionCommand, SelectionContext,
    SelectionManager,
};
use crate::surface::FaceGeometryStore;

struct LoadedMesh {
    mesh: Mesh,
    faces: Vec<ReconstructedFace>,
}

/// Facade tying reconstruction, surfaces, selection and export together.
pub struct FaceSession {
    config: SessionConfig,
    meshes: BTreeMap<u32, LoadedMesh>,
    next_mesh_index: u32,
    store: FaceGeometryStore,
    selection: SelectionManager,
    context: SelectionContext,
}

impl FaceSession {
    /// Starts a session with the configured groups registered and the first
    /// group active.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let selection = SelectionManager::with_groups(config.groups.iter().cloned())?;
        let mut context = SelectionContext::new(config.highlight);
        context.active_group = config.groups.first().map(|g| g.label.clone());
        Ok(Self {
            config,
            meshes: BTreeMap::new(),
            next_mesh_index: 0,
            store: FaceGeometryStore::new(),
            selection,
            context,
        })
    }

    /// Reconstructs and materializes the faces of a new mesh, returning its
    /// mesh index.
    ///
    /// # Errors
    ///
    /// Returns an error if reconstruction or materialization fails; the
    /// session is unchanged in that case.
    #[instrument(skip_all, fields(triangles = mesh.triangle_count()))]
    pub fn load_mesh(&mut self, mesh: Mesh) -> Result<u32> {
        let mesh_index = self.next_mesh_index;
        self.install(mesh_index, mesh)?;
        self.next_mesh_index += 1;
        Ok(mesh_index)
    }

    /// Replaces the mesh at `mesh_index`, rebuilding all of its faces.
    ///
    /// Selections of the old faces are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NotLoaded`] if no mesh is loaded at `mesh_index`,
    /// or an error if the new mesh cannot be reconstructed; the old mesh
    /// stays loaded in that case.
    pub fn replace_mesh(&mut self, mesh_index: u32, mesh: Mesh) -> Result<()> {
        if !self.meshes.contains_key(&mesh_index) {
            return Err(MeshError::NotLoaded(mesh_index).into());
        }
        self.install(mesh_index, mesh)
    }

    /// Unloads a mesh and forgets its faces. Returns whether it was loaded.
    pub fn remove_mesh(&mut self, mesh_index: u32) -> bool {
        let removed = self.store.remove_mesh(mesh_index);
        self.selection.forget_faces(&removed);
        if self.context.hovered.is_some_and(|h| h.mesh_index == mesh_index) {
            self.context.hovered = None;
        }
        self.meshes.remove(&mesh_index).is_some()
    }

    /// Unloads every mesh and clears all selections.
    pub fn clear(&mut self) {
        let all: Vec<FaceId> = self.store.iter().map(|s| s.id()).collect();
        self.selection.forget_faces(&all);
        self.store.clear();
        self.meshes.clear();
        self.context.hovered = None;
        info!("session cleared");
    }

    fn install(&mut self, mesh_index: u32, mesh: Mesh) -> Result<()> {
        let (faces, staged) = self.prepare(mesh_index, &mesh)?;
        self.commit(mesh_index, mesh, faces, staged);
        Ok(())
    }

    fn prepare(
        &self,
        mesh_index: u32,
        mesh: &Mesh,
    ) -> Result<(Vec<ReconstructedFace>, FaceGeometryStore)> {
        let faces = ReconstructFaces::new(mesh_index, self.config.reconstruction).execute(mesh)?;
        let mut staged = FaceGeometryStore::new();
        staged.load(&faces, mesh)?;
        Ok((faces, staged))
    }

    fn commit(
        &mut self,
        mesh_index: u32,
        mesh: Mesh,
        faces: Vec<ReconstructedFace>,
        staged: FaceGeometryStore,
    ) {
        self.remove_mesh(mesh_index);
        for surface in staged.iter() {
            self.selection.track_area(surface.id(), surface.area());
        }
        self.store.absorb(staged);
        self.selection.refresh_faces(
            &self.context,
            &mut self.store,
            faces.iter().map(|f| f.id),
        );
        info!(mesh = mesh_index, faces = faces.len(), "mesh loaded");
        self.meshes.insert(mesh_index, LoadedMesh { mesh, faces });
    }

    /// Source mesh at `mesh_index`.
    #[must_use]
    pub fn mesh(&self, mesh_index: u32) -> Option<&Mesh> {
        self.meshes.get(&mesh_index).map(|m| &m.mesh)
    }

    /// Reconstructed faces of a mesh, in discovery order.
    #[must_use]
    pub fn faces(&self, mesh_index: u32) -> Option<&[ReconstructedFace]> {
        self.meshes.get(&mesh_index).map(|m| m.faces.as_slice())
    }

    /// One reconstructed face.
    #[must_use]
    pub fn face(&self, id: FaceId) -> Option<&ReconstructedFace> {
        let faces = &self.meshes.get(&id.mesh_index)?.faces;
        faces.get(usize::try_from(id.ordinal).ok()?)
    }

    /// Materialized surfaces.
    #[must_use]
    pub fn store(&self) -> &FaceGeometryStore {
        &self.store
    }

    /// Group membership state.
    #[must_use]
    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    /// Active group, hover state and highlight policy.
    #[must_use]
    pub fn context(&self) -> &SelectionContext {
        &self.context
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Applies a selection command and refreshes affected display colors.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::UnknownFace`] for faces that are not loaded,
    /// or any error from [`apply_command`].
    pub fn apply(&mut self, command: SelectionCommand) -> Result<CommandOutcome> {
        let face = match &command {
            SelectionCommand::Toggle(face)
            | SelectionCommand::Assign { face, .. }
            | SelectionCommand::Unassign(face)
            | SelectionCommand::Hover(Some(face)) => Some(*face),
            _ => None,
        };
        if let Some(face) = face {
            if !self.store.contains(face) {
                return Err(SelectionError::UnknownFace(face.to_string()).into());
            }
        }

        let outcome = apply_command(&mut self.selection, &mut self.context, command)?;
        if matches!(outcome, CommandOutcome::ActiveGroupChanged { .. }) {
            self.selection.refresh_display(&self.context, &mut self.store);
        } else {
            self.selection
                .refresh_faces(&self.context, &mut self.store, outcome.touched_faces());
        }
        Ok(outcome)
    }

    /// Updates hover state from a pointer ray. Returns the hovered face.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`FaceSession::apply`].
    pub fn hover(&mut self, ray: &Ray) -> Result<Option<FaceId>> {
        let hit = self.store.pick(ray).map(|h| h.face);
        if hit != self.context.hovered {
            self.apply(SelectionCommand::Hover(hit))?;
        }
        Ok(hit)
    }

    /// Toggles the face under a pointer ray, if any.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`FaceSession::apply`].
    pub fn click(&mut self, ray: &Ray) -> Result<Option<CommandOutcome>> {
        match self.store.pick(ray) {
            Some(hit) => self.apply(SelectionCommand::Toggle(hit.face)).map(Some),
            None => Ok(None),
        }
    }

    /// Makes `label` the group that receives new selections.
    ///
    /// # Errors
    ///
    /// Returns an error if the label is invalid or not registered.
    pub fn set_active_group(&mut self, label: &str) -> Result<()> {
        let label = GroupLabel::new(label)?;
        self.apply(SelectionCommand::SetActiveGroup(label))?;
        Ok(())
    }

    /// Count and area of every non-empty group.
    #[must_use]
    pub fn summary(&self) -> Vec<GroupSummary> {
        self.selection.group_summary()
    }

    /// Exports one group, or `None` if it is empty.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown groups or write failures.
    pub fn export_group(&self, label: &str) -> Result<Option<ExportedSurface>> {
        ExportGroup::new(GroupLabel::new(label)?)
            .with_extension(self.config.file_extension.clone())
            .execute(&self.selection, &self.store)
    }

    /// Exports a hollow enclosure around every loaded face, or `None` if
    /// nothing is loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if `wall_thickness` leaves no cavity inside the
    /// bounds.
    pub fn export_enclosure(&self, wall_thickness: f64) -> Result<Option<ExportedSurface>> {
        self.store
            .bounds()
            .map(|bounds| {
                ExportEnclosure::new(bounds)
                    .with_wall_thickness(wall_thickness)
                    .with_extension(self.config.file_extension.clone())
                    .execute()
            })
            .transpose()
    }

    /// Exports every non-empty group.
    ///
    /// # Errors
    ///
    /// Returns an error on the first group that fails to export.
    pub fn export_all(&self) -> Result<ExportReport> {
        ExportGroups::all()
            .with_extension(self.config.file_extension.clone())
            .execute(&self.selection, &self.store)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::FacemapError;
    use crate::math::{Point3, Vector3};
    use crate::surface::Color;

    fn session() -> FaceSession {
        let mut session = FaceSession::new(SessionConfig::default()).unwrap();
        session
            .load_mesh(crate::reconstruct::tests::folded_squares())
            .unwrap();
        session
    }

    /// `n` coplanar triangles 20 units apart, one face each.
    fn scattered(n: u32) -> Mesh {
        let mut vertices = Vec::new();
        for i in 0..n {
            let x = f64::from(i) * 20.0;
            vertices.extend_from_slice(&[x, 0.0, 0.0, x + 1.0, 0.0, 0.0, x, 1.0, 0.0]);
        }
        let indices: Vec<u32> = (0..n * 3).collect();
        Mesh::from_buffers(&vertices, &indices, None).unwrap()
    }

    fn down_at(x: f64, y: f64) -> Ray {
        Ray::new(Point3::new(x, y, 5.0), -Vector3::z())
    }

    #[test]
    fn first_group_is_active() {
        let s = session();
        assert_eq!(s.context().active_group.as_ref().unwrap().as_str(), "inlet");
        assert_eq!(s.store().len(), 2);
        assert_eq!(s.faces(0).unwrap().len(), 2);
    }

    #[test]
    fn click_selects_and_colors_face() {
        let mut s = session();
        let out = s.click(&down_at(0.5, 0.5)).unwrap().unwrap();
        assert!(matches!(out, CommandOutcome::Selected { .. }));

        let floor = FaceId::new(0, 0);
        let inlet_color = s.selection().group("inlet").unwrap().color();
        assert_eq!(s.store().get(floor).unwrap().color(), inlet_color);

        s.click(&down_at(0.5, 0.5)).unwrap();
        assert!(!s.selection().is_assigned(floor));
        assert_eq!(s.store().get(floor).unwrap().color(), Color::DEFAULT_FACE);
    }

    #[test]
    fn hover_colors_unassigned_face() {
        let mut s = session();
        let hovered = s.hover(&down_at(0.5, 0.5)).unwrap();
        assert_eq!(hovered, Some(FaceId::new(0, 0)));
        assert_eq!(s.store().get(FaceId::new(0, 0)).unwrap().color(), Color::HOVER);

        assert_eq!(s.hover(&down_at(9.0, 9.0)).unwrap(), None);
        assert_eq!(s.store().get(FaceId::new(0, 0)).unwrap().color(), Color::DEFAULT_FACE);
    }

    #[test]
    fn switching_active_group_dims_other_selections() {
        let mut s = session();
        s.click(&down_at(0.5, 0.5)).unwrap();
        s.set_active_group("wall").unwrap();
        let surface = s.store().get(FaceId::new(0, 0)).unwrap();
        assert!((surface.opacity() - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_face_rejected() {
        let mut s = session();
        let err = s.apply(SelectionCommand::Toggle(FaceId::new(7, 0))).unwrap_err();
        assert!(matches!(err, FacemapError::Selection(SelectionError::UnknownFace(_))));
    }

    #[test]
    fn replace_mesh_drops_stale_selection() {
        let mut s = session();
        s.apply(SelectionCommand::Assign {
            face: FaceId::new(0, 1),
            group: GroupLabel::new("wall").unwrap(),
        })
        .unwrap();
        assert_eq!(s.summary().len(), 1);

        s.replace_mesh(0, crate::reconstruct::tests::folded_squares()).unwrap();
        assert!(s.summary().is_empty());
        assert_eq!(s.store().len(), 2);
        s.selection().check_invariants().unwrap();
    }

    #[test]
    fn replace_requires_loaded_mesh() {
        let mut s = session();
        let err = s.replace_mesh(1, scattered(6)).unwrap_err();
        assert!(matches!(err, FacemapError::Mesh(MeshError::NotLoaded(1))));
        assert_eq!(s.store().len(), 2);

        assert_eq!(s.load_mesh(scattered(2)).unwrap(), 1);
        assert_eq!(s.store().len(), 4);
    }

    #[test]
    fn shrinking_replacement_leaves_no_orphan_faces() {
        let mut s = session();
        s.replace_mesh(0, scattered(6)).unwrap();
        assert_eq!(s.store().len(), 6);
        let last = FaceId::new(0, 5);
        s.apply(SelectionCommand::Assign {
            face: last,
            group: GroupLabel::new("wall").unwrap(),
        })
        .unwrap();

        s.replace_mesh(0, scattered(2)).unwrap();
        assert_eq!(s.store().len(), 2);
        assert!(s.face(last).is_none());
        assert!(!s.store().contains(last));
        assert_eq!(s.selection().assigned_count(), 0);
        assert!(s.export_group("wall").unwrap().is_none());
        s.selection().check_invariants().unwrap();
    }

    #[test]
    fn enclosure_wraps_loaded_faces() {
        let mut s = FaceSession::new(SessionConfig::default()).unwrap();
        assert!(s.export_enclosure(0.25).unwrap().is_none());

        s.load_mesh(crate::reconstruct::tests::folded_squares()).unwrap();
        let file = s.export_enclosure(0.25).unwrap().unwrap();
        assert_eq!(file.file_name, "bounding_box.stl");
        assert_eq!(file.triangle_count, 24);

        // unit bounds leave no room for the default two-unit wall
        assert!(s.export_enclosure(crate::export::DEFAULT_WALL_THICKNESS).is_err());
    }

    #[test]
    fn export_through_session() {
        let mut s = session();
        s.click(&down_at(0.5, 0.5)).unwrap();
        let file = s.export_group("inlet").unwrap().unwrap();
        assert_eq!(file.file_name, "inlet_faces.stl");
        assert!(s.export_group("outlet").unwrap().is_none());

        let report = s.export_all().unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.skipped.len(), 4);
    }

    #[test]
    fn summary_reports_area() {
        let mut s = session();
        s.click(&down_at(0.5, 0.5)).unwrap();
        let summary = s.summary();
        assert_eq!(summary[0].face_count, 1);
        assert!((summary[0].total_area.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn clear_resets_everything() {
        let mut s = session();
        s.click(&down_at(0.5, 0.5)).unwrap();
        s.clear();
        assert!(s.store().is_empty());
        assert_eq!(s.selection().assigned_count(), 0);
        assert!(s.faces(0).is_none());
    }

    #[test]
    fn second_mesh_gets_next_index() {
        let mut s = session();
        let index = s
            .load_mesh(crate::reconstruct::tests::folded_squares())
            .unwrap();
        assert_eq!(index, 1);
        assert_eq!(s.store().len(), 4);
        assert_eq!(s.face(FaceId::new(1, 1)).unwrap().triangles, vec![2, 3]);
    }
}
