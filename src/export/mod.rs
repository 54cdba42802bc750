//! Per-group ASCII STL export.
//!
//! Each non-empty group becomes one independent solid file named
//! `<group>_faces.<ext>`. Empty groups are skipped with a warning rather than
//! producing a solid without facets. [`ExportEnclosure`] writes the hollow
//! box that bounds the simulation domain around the model.

mod enclosure;
mod project;
mod stl;

pub use enclosure::{ExportEnclosure, DEFAULT_ENCLOSURE_NAME, DEFAULT_WALL_THICKNESS};
pub use project::{ProjectStatus, ProjectStore, ProjectSummary, StoredFile, SurfaceMetadata};
pub use stl::{facet_normal, StlWriter};

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::error::{ExportError, Result, SelectionError};
use crate::selection::{GroupLabel, SelectionManager};
use crate::surface::FaceGeometryStore;

/// Default output file extension.
pub const DEFAULT_EXTENSION: &str = "stl";

/// One exported group.
#[derive(Debug, Clone)]
pub struct ExportedSurface {
    /// Name of the solid: the group it was built from, or the enclosure name.
    pub group: GroupLabel,
    /// `<group>_faces.<ext>`.
    pub file_name: String,
    /// ASCII STL text.
    pub contents: Vec<u8>,
    /// Number of faces written.
    pub face_count: usize,
    /// Number of facets written.
    pub triangle_count: usize,
    /// Total world-space area of the written faces.
    pub area: f64,
}

impl ExportedSurface {
    /// Writes the file into `dir`, returning its path.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the file cannot be written.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.contents).map_err(ExportError::from)?;
        info!(path = %path.display(), bytes = self.contents.len(), "surface written");
        Ok(path)
    }
}

/// Output file name for a group.
#[must_use]
pub fn file_name_for(group: &GroupLabel, extension: &str) -> String {
    format!("{group}_faces.{extension}")
}

/// Exports one group as an ASCII STL solid.
pub struct ExportGroup {
    group: GroupLabel,
    extension: String,
}

impl ExportGroup {
    /// Creates a new `ExportGroup` operation.
    #[must_use]
    pub fn new(group: GroupLabel) -> Self {
        Self {
            group,
            extension: DEFAULT_EXTENSION.to_owned(),
        }
    }

    /// Overrides the output file extension.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Executes the export.
    ///
    /// Returns `Ok(None)` and logs a warning when the group has no faces.
    ///
    /// # Errors
    ///
    /// Returns an error if the group is not registered, a member face has no
    /// surface in `store`, or writing fails.
    #[instrument(skip_all, fields(group = %self.group))]
    pub fn execute(
        &self,
        selection: &SelectionManager,
        store: &FaceGeometryStore,
    ) -> Result<Option<ExportedSurface>> {
        let members = selection.members(self.group.as_str())?;
        if members.is_empty() {
            warn!("group has no faces; nothing exported");
            return Ok(None);
        }

        let name = self.group.as_str();
        let mut writer = StlWriter::begin(Vec::new(), name).map_err(ExportError::from)?;
        let mut area = 0.0;
        for &face in members {
            let surface = store
                .get(face)
                .ok_or_else(|| SelectionError::UnknownFace(face.to_string()))?;
            for tri in surface.triangles() {
                writer.facet(&tri).map_err(ExportError::from)?;
            }
            area += surface.area();
        }
        let (contents, triangle_count) = writer.finish(name).map_err(ExportError::from)?;

        let exported = ExportedSurface {
            group: self.group.clone(),
            file_name: file_name_for(&self.group, &self.extension),
            contents,
            face_count: members.len(),
            triangle_count,
            area,
        };
        info!(
            faces = exported.face_count,
            triangles = exported.triangle_count,
            bytes = exported.contents.len(),
            "group exported"
        );
        Ok(Some(exported))
    }
}

/// Outcome of a batch export.
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    /// One file per non-empty group.
    pub files: Vec<ExportedSurface>,
    /// Requested groups that had no faces.
    pub skipped: Vec<GroupLabel>,
}

/// Exports several groups, one independent file each.
pub struct ExportGroups {
    groups: Option<Vec<GroupLabel>>,
    extension: String,
}

impl ExportGroups {
    /// Exports every registered group.
    #[must_use]
    pub fn all() -> Self {
        Self {
            groups: None,
            extension: DEFAULT_EXTENSION.to_owned(),
        }
    }

    /// Exports the listed groups, in order.
    #[must_use]
    pub fn new(groups: Vec<GroupLabel>) -> Self {
        Self {
            groups: Some(groups),
            extension: DEFAULT_EXTENSION.to_owned(),
        }
    }

    /// Overrides the output file extension.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Executes the batch.
    ///
    /// # Errors
    ///
    /// Fails on the first group that cannot be exported.
    pub fn execute(&self, selection: &SelectionManager, store: &FaceGeometryStore) -> Result<ExportReport> {
        let labels: Vec<GroupLabel> = match &self.groups {
            Some(groups) => groups.clone(),
            None => selection.groups().map(|g| g.label().clone()).collect(),
        };

        let mut report = ExportReport::default();
        for label in labels {
            let op = ExportGroup::new(label.clone()).with_extension(self.extension.clone());
            match op.execute(selection, store)? {
                Some(file) => report.files.push(file),
                None => report.skipped.push(label),
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;
    use crate::reconstruct::{FaceId, ReconstructFaces, ReconstructionParams};
    use crate::selection::GroupDefinition;

    /// A 2x1 rectangle (area 2, two triangles) plus a separate wall.
    fn scene() -> (SelectionManager, FaceGeometryStore) {
        let mesh = Mesh::from_buffers(
            &[
                0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 2.0, 1.0, 0.0, 0.0, 1.0, 0.0, // floor
                0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, // wall triangle (x = 0)
            ],
            &[0, 1, 2, 0, 2, 3, 4, 5, 6],
            None,
        )
        .unwrap();
        let faces = ReconstructFaces::new(0, ReconstructionParams::default())
            .execute(&mesh)
            .unwrap();
        assert_eq!(faces.len(), 2);

        let mut store = FaceGeometryStore::new();
        store.load(&faces, &mesh).unwrap();
        let manager = SelectionManager::with_groups(GroupDefinition::defaults()).unwrap();
        (manager, store)
    }

    fn label(s: &str) -> GroupLabel {
        GroupLabel::new(s).unwrap()
    }

    #[test]
    fn inlet_export_has_one_solid_with_two_facets() {
        let (mut manager, store) = scene();
        manager.assign(FaceId::new(0, 0), "inlet").unwrap();

        let exported = ExportGroup::new(label("inlet"))
            .execute(&manager, &store)
            .unwrap()
            .unwrap();
        let text = String::from_utf8(exported.contents.clone()).unwrap();

        assert_eq!(exported.file_name, "inlet_faces.stl");
        assert_eq!(exported.triangle_count, 2);
        assert!((exported.area - 2.0).abs() < 1e-12);
        assert_eq!(text.lines().filter(|l| *l == "solid inlet").count(), 1);
        assert_eq!(text.lines().filter(|l| *l == "endsolid inlet").count(), 1);
        assert!(text.starts_with("solid inlet\n"));
        assert!(text.ends_with("endsolid inlet\n"));
        assert_eq!(text.lines().filter(|l| l.trim_start().starts_with("facet normal")).count(), 2);
        assert_eq!(text.lines().filter(|l| l.trim() == "endfacet").count(), 2);

        for line in text.lines().filter(|l| l.trim_start().starts_with("vertex")) {
            let coords: Vec<&str> = line.split_whitespace().skip(1).collect();
            assert_eq!(coords.len(), 3);
            for c in coords {
                let (_, frac) = c.split_once('.').unwrap();
                assert_eq!(frac.len(), 6, "bad precision in {line}");
            }
        }
    }

    #[test]
    fn empty_group_produces_no_file() {
        let (manager, store) = scene();
        let exported = ExportGroup::new(label("outlet")).execute(&manager, &store).unwrap();
        assert!(exported.is_none());
    }

    #[test]
    fn unknown_group_is_an_error() {
        let (manager, store) = scene();
        assert!(ExportGroup::new(label("exhaust")).execute(&manager, &store).is_err());
    }

    #[test]
    fn batch_export_makes_one_file_per_group() {
        let (mut manager, store) = scene();
        manager.assign(FaceId::new(0, 0), "inlet").unwrap();
        manager.assign(FaceId::new(0, 1), "wall").unwrap();

        let report = ExportGroups::all().execute(&manager, &store).unwrap();
        let names: Vec<_> = report.files.iter().map(|f| f.file_name.as_str()).collect();
        assert_eq!(names, vec!["inlet_faces.stl", "wall_faces.stl"]);
        assert_eq!(report.skipped.len(), 3);

        for file in &report.files {
            let text = String::from_utf8(file.contents.clone()).unwrap();
            assert_eq!(text.matches("endsolid").count(), 1);
        }
    }

    #[test]
    fn custom_extension() {
        let (mut manager, store) = scene();
        manager.assign(FaceId::new(0, 1), "wall").unwrap();
        let exported = ExportGroup::new(label("wall"))
            .with_extension("ast")
            .execute(&manager, &store)
            .unwrap()
            .unwrap();
        assert_eq!(exported.file_name, "wall_faces.ast");
    }

    #[test]
    fn write_to_dir_creates_file() {
        let (mut manager, store) = scene();
        manager.assign(FaceId::new(0, 0), "inlet").unwrap();
        let exported = ExportGroup::new(label("inlet")).execute(&manager, &store).unwrap().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = exported.write_to_dir(dir.path()).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), exported.contents);
    }
}
