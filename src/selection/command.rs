use tracing::debug;

use crate::error::SelectionError;
use crate::reconstruct::FaceId;

use super::{GroupLabel, SelectionContext, SelectionManager, Toggle};

/// A discrete user action on selection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionCommand {
    /// Click on a face: select into the active group or deselect.
    Toggle(FaceId),
    /// Put a face into a specific group.
    Assign { face: FaceId, group: GroupLabel },
    /// Remove a face from its group.
    Unassign(FaceId),
    /// Empty one group.
    ClearGroup(GroupLabel),
    /// Empty every group.
    ClearAll,
    /// Choose the group that receives new selections.
    SetActiveGroup(GroupLabel),
    /// Pointer moved onto a face, or off all faces.
    Hover(Option<FaceId>),
}

/// What a command changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Selected { face: FaceId, group: GroupLabel },
    Deselected { face: FaceId, group: GroupLabel },
    Assigned { face: FaceId, group: GroupLabel, previous: Option<GroupLabel> },
    Unassigned { face: FaceId, group: Option<GroupLabel> },
    Cleared { group: Option<GroupLabel>, faces: Vec<FaceId> },
    ActiveGroupChanged { previous: Option<GroupLabel>, current: GroupLabel },
    HoverChanged { previous: Option<FaceId>, current: Option<FaceId> },
}

impl CommandOutcome {
    /// Faces whose display state may have changed.
    #[must_use]
    pub fn touched_faces(&self) -> Vec<FaceId> {
        match self {
            CommandOutcome::Selected { face, .. }
            | CommandOutcome::Deselected { face, .. }
            | CommandOutcome::Assigned { face, .. }
            | CommandOutcome::Unassigned { face, .. } => vec![*face],
            CommandOutcome::Cleared { faces, .. } => faces.clone(),
            CommandOutcome::HoverChanged { previous, current } => {
                previous.iter().chain(current.iter()).copied().collect()
            }
            CommandOutcome::ActiveGroupChanged { .. } => Vec::new(),
        }
    }
}

/// Applies one command to selection state.
///
/// Commands either succeed completely or leave both `manager` and `ctx`
/// unchanged.
///
/// # Errors
///
/// Returns [`SelectionError::NoActiveGroup`] when toggling an unassigned face
/// with no active group, and [`SelectionError::UnknownGroup`] for labels that
/// are not registered.
pub fn apply_command(
    manager: &mut SelectionManager,
    ctx: &mut SelectionContext,
    command: SelectionCommand,
) -> Result<CommandOutcome, SelectionError> {
    debug!(?command, "applying selection command");
    let outcome = match command {
        SelectionCommand::Toggle(face) => {
            // an assigned face is deselected whatever the active group is
            let active = ctx.active_group.as_ref().map_or("", GroupLabel::as_str);
            if active.is_empty() && !manager.is_assigned(face) {
                return Err(SelectionError::NoActiveGroup);
            }
            match manager.toggle_select(face, active)? {
                Toggle::Selected(group) => CommandOutcome::Selected { face, group },
                Toggle::Deselected(group) => CommandOutcome::Deselected { face, group },
            }
        }
        SelectionCommand::Assign { face, group } => {
            let previous = manager.assign(face, group.as_str())?;
            CommandOutcome::Assigned {
                face,
                group,
                previous,
            }
        }
        SelectionCommand::Unassign(face) => CommandOutcome::Unassigned {
            face,
            group: manager.unassign(face),
        },
        SelectionCommand::ClearGroup(group) => {
            let faces = manager.clear_group(group.as_str())?;
            CommandOutcome::Cleared {
                group: Some(group),
                faces,
            }
        }
        SelectionCommand::ClearAll => {
            let faces: Vec<FaceId> = manager
                .groups()
                .flat_map(|g| g.faces().iter().copied())
                .collect();
            manager.clear_all();
            CommandOutcome::Cleared { group: None, faces }
        }
        SelectionCommand::SetActiveGroup(group) => {
            if manager.group(group.as_str()).is_none() {
                return Err(SelectionError::UnknownGroup(group.to_string()));
            }
            let previous = ctx.active_group.replace(group.clone());
            CommandOutcome::ActiveGroupChanged {
                previous,
                current: group,
            }
        }
        SelectionCommand::Hover(face) => {
            let previous = std::mem::replace(&mut ctx.hovered, face);
            CommandOutcome::HoverChanged {
                previous,
                current: face,
            }
        }
    };
    Ok(outcome)
}
