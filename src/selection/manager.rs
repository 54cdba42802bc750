use std::collections::{BTreeSet, HashMap};

use tracing::{debug, instrument};

use crate::error::SelectionError;
use crate::reconstruct::FaceId;

use super::{Group, GroupDefinition, GroupLabel, GroupSummary};

/// Result of [`SelectionManager::toggle_select`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggle {
    /// The face was unassigned and now belongs to the group.
    Selected(GroupLabel),
    /// The face was removed from the group it belonged to.
    Deselected(GroupLabel),
}

/// Maps faces to physical groups.
///
/// Every face belongs to at most one group. The inverse index is updated in
/// the same call as the group sets, so the two never disagree between public
/// calls. Wrap the manager in a single `Mutex` when sharing it across threads.
#[derive(Debug, Clone, Default)]
pub struct SelectionManager {
    groups: Vec<Group>,
    index: HashMap<FaceId, GroupLabel>,
    areas: HashMap<FaceId, f64>,
}

impl SelectionManager {
    /// Creates a manager with no registered groups.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager with the given groups registered, in order.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::DuplicateGroup`] if a label repeats.
    pub fn with_groups(
        definitions: impl IntoIterator<Item = GroupDefinition>,
    ) -> Result<Self, SelectionError> {
        let mut manager = Self::new();
        for definition in definitions {
            manager.register_group(definition)?;
        }
        Ok(manager)
    }

    /// Registers a new, empty group.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::DuplicateGroup`] if the label is taken.
    pub fn register_group(&mut self, definition: GroupDefinition) -> Result<(), SelectionError> {
        if self.group(definition.label.as_str()).is_some() {
            return Err(SelectionError::DuplicateGroup(definition.label.to_string()));
        }
        self.groups.push(Group::new(definition));
        Ok(())
    }

    /// Registered groups in registration order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    /// Looks up a registered group.
    #[must_use]
    pub fn group(&self, label: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.label.as_str() == label)
    }

    fn position(&self, label: &str) -> Result<usize, SelectionError> {
        self.groups
            .iter()
            .position(|g| g.label.as_str() == label)
            .ok_or_else(|| SelectionError::UnknownGroup(label.to_owned()))
    }

    /// Members of a registered group.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::UnknownGroup`] for unregistered labels.
    pub fn members(&self, label: &str) -> Result<&BTreeSet<FaceId>, SelectionError> {
        Ok(&self.groups[self.position(label)?].faces)
    }

    /// Current group of `face`, if any.
    #[must_use]
    pub fn group_of(&self, face: FaceId) -> Option<&GroupLabel> {
        self.index.get(&face)
    }

    /// Whether `face` belongs to any group.
    #[must_use]
    pub fn is_assigned(&self, face: FaceId) -> bool {
        self.index.contains_key(&face)
    }

    /// Total number of assigned faces.
    #[must_use]
    pub fn assigned_count(&self) -> usize {
        self.index.len()
    }

    /// Moves `face` into `label`, removing it from its previous group.
    ///
    /// Assigning a face to the group it already occupies changes nothing.
    /// Returns the previous group, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::UnknownGroup`] for unregistered labels; the
    /// state is left untouched.
    #[instrument(skip(self, face), fields(face = %face))]
    pub fn assign(&mut self, face: FaceId, label: &str) -> Result<Option<GroupLabel>, SelectionError> {
        let target = self.position(label)?;
        let previous = self.index.get(&face).cloned();
        if previous.as_ref().is_some_and(|p| p.as_str() == label) {
            return Ok(previous);
        }
        if let Some(prev) = &previous {
            let old = self.position(prev.as_str())?;
            self.groups[old].faces.remove(&face);
        }
        self.groups[target].faces.insert(face);
        self.index.insert(face, self.groups[target].label.clone());
        debug!(group = label, previous = ?previous.as_ref().map(GroupLabel::as_str), "face assigned");
        Ok(previous)
    }

    /// Removes `face` from its group. Returns the group it left, if any.
    pub fn unassign(&mut self, face: FaceId) -> Option<GroupLabel> {
        let label = self.index.remove(&face)?;
        if let Some(group) = self.groups.iter_mut().find(|g| g.label == label) {
            group.faces.remove(&face);
        }
        debug!(face = %face, group = label.as_str(), "face unassigned");
        Some(label)
    }

    /// Click-to-select: unassigns an assigned face, otherwise assigns it to
    /// `current_group`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::UnknownGroup`] if the face is unassigned and
    /// `current_group` is not registered.
    pub fn toggle_select(&mut self, face: FaceId, current_group: &str) -> Result<Toggle, SelectionError> {
        if let Some(label) = self.unassign(face) {
            return Ok(Toggle::Deselected(label));
        }
        self.assign(face, current_group)?;
        Ok(Toggle::Selected(self.groups[self.position(current_group)?].label.clone()))
    }

    /// Unassigns every face in `label`, returning them.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::UnknownGroup`] for unregistered labels.
    pub fn clear_group(&mut self, label: &str) -> Result<Vec<FaceId>, SelectionError> {
        let position = self.position(label)?;
        let faces = std::mem::take(&mut self.groups[position].faces);
        for face in &faces {
            self.index.remove(face);
        }
        debug!(group = label, cleared = faces.len(), "group cleared");
        Ok(faces.into_iter().collect())
    }

    /// Unassigns every face in every group. Returns how many were cleared.
    pub fn clear_all(&mut self) -> usize {
        for group in &mut self.groups {
            group.faces.clear();
        }
        let cleared = self.index.len();
        self.index.clear();
        debug!(cleared, "all groups cleared");
        cleared
    }

    /// Records the area of `face` for summaries.
    pub fn track_area(&mut self, face: FaceId, area: f64) {
        self.areas.insert(face, area);
    }

    /// Drops selection and area data for faces that no longer exist.
    pub fn forget_faces(&mut self, faces: &[FaceId]) {
        for &face in faces {
            self.unassign(face);
            self.areas.remove(&face);
        }
    }

    /// Count and area of every non-empty group, in registration order.
    #[must_use]
    pub fn group_summary(&self) -> Vec<GroupSummary> {
        self.groups
            .iter()
            .filter(|g| !g.faces.is_empty())
            .map(|g| GroupSummary {
                label: g.label.clone(),
                color: g.color,
                face_count: g.faces.len(),
                total_area: g
                    .faces
                    .iter()
                    .map(|f| self.areas.get(f))
                    .sum::<Option<f64>>(),
            })
            .collect()
    }

    /// Verifies that the inverse index matches the group sets exactly.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::Inconsistent`] describing the first mismatch.
    pub fn check_invariants(&self) -> Result<(), SelectionError> {
        let total: usize = self.groups.iter().map(|g| g.faces.len()).sum();
        if total != self.index.len() {
            return Err(SelectionError::Inconsistent(format!(
                "{total} group memberships but {} indexed faces",
                self.index.len()
            )));
        }
        for group in &self.groups {
            for face in &group.faces {
                match self.index.get(face) {
                    Some(label) if *label == group.label => {}
                    other => {
                        return Err(SelectionError::Inconsistent(format!(
                            "{face} is in '{}' but indexed as {other:?}",
                            group.label
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
