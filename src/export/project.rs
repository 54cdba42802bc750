use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{ExportError, Result};

use super::{ExportedSurface, DEFAULT_EXTENSION};

/// Sidecar written next to every stored surface file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMetadata {
    pub group: String,
    pub face_count: usize,
    pub triangle_count: usize,
    pub area: f64,
    pub file_size: u64,
    pub timestamp: DateTime<Utc>,
}

/// A surface file found in a project directory.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
    pub metadata: Option<SurfaceMetadata>,
}

/// Contents of one project directory, newest files first.
#[derive(Debug, Clone)]
pub struct ProjectStatus {
    pub project_id: String,
    pub files: Vec<StoredFile>,
    pub total_size: u64,
}

/// One entry of [`ProjectStore::list_projects`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub project_id: String,
    pub file_count: usize,
    pub modified: DateTime<Utc>,
}

/// Directory-backed storage of exported surfaces, one subdirectory per project.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
    extension: String,
}

impl ProjectStore {
    /// Creates a store rooted at `root`. Nothing is touched on disk yet.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: DEFAULT_EXTENSION.to_owned(),
        }
    }

    /// Sets the extension recognized when listing files.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn project_dir(&self, project_id: &str) -> Result<PathBuf> {
        if is_plain_name(project_id) {
            Ok(self.root.join(project_id))
        } else {
            Err(ExportError::InvalidProjectId(project_id.to_owned()).into())
        }
    }

    /// Writes `surface` and its metadata sidecar into the project directory,
    /// creating it if needed. Existing files for the same group are replaced.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid project ids or I/O failures.
    #[instrument(skip(self, surface), fields(file = %surface.file_name))]
    pub fn store(&self, project_id: &str, surface: &ExportedSurface) -> Result<StoredFile> {
        let dir = self.project_dir(project_id)?;
        fs::create_dir_all(&dir).map_err(ExportError::from)?;

        let path = dir.join(&surface.file_name);
        fs::write(&path, &surface.contents).map_err(ExportError::from)?;

        let metadata = SurfaceMetadata {
            group: surface.group.to_string(),
            face_count: surface.face_count,
            triangle_count: surface.triangle_count,
            area: surface.area,
            file_size: surface.contents.len() as u64,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&metadata).map_err(ExportError::from)?;
        fs::write(metadata_path(&path), json).map_err(ExportError::from)?;

        info!(path = %path.display(), bytes = metadata.file_size, "surface stored");
        Ok(StoredFile {
            name: surface.file_name.clone(),
            size: metadata.file_size,
            modified: metadata.timestamp,
            path,
            metadata: Some(metadata),
        })
    }

    /// Lists the surface files of one project, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::ProjectNotFound`] if the project directory does
    /// not exist, or an I/O error while reading it.
    pub fn project_status(&self, project_id: &str) -> Result<ProjectStatus> {
        let dir = self.project_dir(project_id)?;
        if !dir.is_dir() {
            return Err(ExportError::ProjectNotFound(project_id.to_owned()).into());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir).map_err(ExportError::from)? {
            let entry = entry.map_err(ExportError::from)?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            let stat = entry.metadata().map_err(ExportError::from)?;
            let modified = stat.modified().map_or_else(|_| Utc::now(), DateTime::<Utc>::from);
            files.push(StoredFile {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: stat.len(),
                modified,
                metadata: read_metadata(&path),
                path,
            });
        }
        files.sort_by(|a, b| {
            sort_time(b)
                .cmp(&sort_time(a))
                .then_with(|| a.name.cmp(&b.name))
        });

        let total_size = files.iter().map(|f| f.size).sum();
        Ok(ProjectStatus {
            project_id: project_id.to_owned(),
            files,
            total_size,
        })
    }

    /// Reads back a stored file of a project.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidProjectId`] or
    /// [`ExportError::InvalidFileName`] for names that could leave the
    /// project directory, [`ExportError::FileNotFound`] if no such file is
    /// stored, or an I/O error while reading it.
    pub fn read(&self, project_id: &str, file_name: &str) -> Result<Vec<u8>> {
        let dir = self.project_dir(project_id)?;
        if !is_plain_name(file_name) {
            return Err(ExportError::InvalidFileName(file_name.to_owned()).into());
        }
        let path = dir.join(file_name);
        if !path.is_file() {
            return Err(ExportError::FileNotFound {
                project: project_id.to_owned(),
                file: file_name.to_owned(),
            }
            .into());
        }
        let bytes = fs::read(&path).map_err(ExportError::from)?;
        debug!(path = %path.display(), bytes = bytes.len(), "stored file read");
        Ok(bytes)
    }

    /// Lists projects under the root, most recently modified first.
    ///
    /// A missing root yields an empty list. Directories whose names are not
    /// valid project ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the root cannot be read.
    pub fn list_projects(&self) -> Result<Vec<ProjectSummary>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut projects = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(ExportError::from)? {
            let entry = entry.map_err(ExportError::from)?;
            if !entry.file_type().map_err(ExportError::from)?.is_dir() {
                continue;
            }
            let project_id = entry.file_name().to_string_lossy().into_owned();
            if !is_plain_name(&project_id) {
                warn!(dir = %entry.path().display(), "skipping directory that is not a project");
                continue;
            }
            let status = self.project_status(&project_id)?;
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .map_or_else(|_| Utc::now(), DateTime::<Utc>::from);
            projects.push(ProjectSummary {
                project_id,
                file_count: status.files.len(),
                modified,
            });
        }
        projects.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.project_id.cmp(&b.project_id))
        });
        Ok(projects)
    }
}

/// Single path component of ASCII alphanumerics, `-`, `_` and `.`, never
/// `.` or containing `..`.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn metadata_path(surface_path: &Path) -> PathBuf {
    let stem = surface_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    surface_path.with_file_name(format!("{stem}_metadata.json"))
}

fn read_metadata(surface_path: &Path) -> Option<SurfaceMetadata> {
    let path = metadata_path(surface_path);
    let text = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&text) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable metadata");
            None
        }
    }
}

fn sort_time(file: &StoredFile) -> DateTime<Utc> {
    file.metadata.as_ref().map_or(file.modified, |m| m.timestamp)
}
