use serde::{Deserialize, Serialize};

use crate::reconstruct::FaceId;
use crate::surface::{Color, FaceGeometryStore};

use super::{GroupLabel, SelectionManager};

/// Colors and opacities used to derive a face's display state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightPolicy {
    /// Color of an unassigned face under the pointer.
    pub hover_color: Color,
    /// Color of an unassigned face.
    pub default_color: Color,
    /// Opacity of faces assigned to a group other than the active one.
    pub inactive_opacity: f32,
}

impl Default for HighlightPolicy {
    fn default() -> Self {
        Self {
            hover_color: Color::HOVER,
            default_color: Color::DEFAULT_FACE,
            inactive_opacity: 0.4,
        }
    }
}

/// Per-session editing state threaded through selection calls.
#[derive(Debug, Clone, Default)]
pub struct SelectionContext {
    /// Group that receives new selections.
    pub active_group: Option<GroupLabel>,
    /// Face currently under the pointer.
    pub hovered: Option<FaceId>,
    pub policy: HighlightPolicy,
}

impl SelectionContext {
    /// Creates a context with no active group and nothing hovered.
    #[must_use]
    pub fn new(policy: HighlightPolicy) -> Self {
        Self {
            active_group: None,
            hovered: None,
            policy,
        }
    }
}

/// Display state of one face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Highlight {
    pub color: Color,
    pub opacity: f32,
}

/// Derives the display state of `face` from selection state alone.
///
/// Assigned faces take their group's color, dimmed unless the group is the
/// active one. Unassigned faces show the hover color under the pointer and
/// the default color otherwise.
#[must_use]
pub fn highlight(face: FaceId, manager: &SelectionManager, ctx: &SelectionContext) -> Highlight {
    let policy = &ctx.policy;
    match manager.group_of(face) {
        Some(label) => {
            let color = manager
                .group(label.as_str())
                .map_or(policy.default_color, super::Group::color);
            let opacity = if ctx.active_group.as_ref() == Some(label) {
                1.0
            } else {
                policy.inactive_opacity
            };
            Highlight { color, opacity }
        }
        None if ctx.hovered == Some(face) => Highlight {
            color: policy.hover_color,
            opacity: 1.0,
        },
        None => Highlight {
            color: policy.default_color,
            opacity: 1.0,
        },
    }
}

impl SelectionManager {
    /// Writes the derived display state of every surface into `store`.
    pub fn refresh_display(&self, ctx: &SelectionContext, store: &mut FaceGeometryStore) {
        for surface in store.iter_mut() {
            let h = highlight(surface.id(), self, ctx);
            surface.set_display(h.color, h.opacity);
        }
    }

    /// Writes the derived display state of the given faces into `store`.
    pub fn refresh_faces(
        &self,
        ctx: &SelectionContext,
        store: &mut FaceGeometryStore,
        faces: impl IntoIterator<Item = FaceId>,
    ) {
        for face in faces {
            if let Some(surface) = store.get_mut(face) {
                let h = highlight(face, self, ctx);
                surface.set_display(h.color, h.opacity);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::selection::GroupDefinition;

    fn setup() -> (SelectionManager, SelectionContext) {
        let manager = SelectionManager::with_groups(GroupDefinition::defaults()).unwrap();
        let mut ctx = SelectionContext::new(HighlightPolicy::default());
        ctx.active_group = Some(GroupLabel::new("inlet").unwrap());
        (manager, ctx)
    }

    #[test]
    fn active_group_member_is_opaque() {
        let (mut m, ctx) = setup();
        let face = FaceId::new(0, 0);
        m.assign(face, "inlet").unwrap();
        let h = highlight(face, &m, &ctx);
        assert_eq!(h.color, m.group("inlet").unwrap().color());
        assert!((h.opacity - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn other_group_member_is_dimmed() {
        let (mut m, ctx) = setup();
        let face = FaceId::new(0, 0);
        m.assign(face, "wall").unwrap();
        let h = highlight(face, &m, &ctx);
        assert_eq!(h.color, m.group("wall").unwrap().color());
        assert!((h.opacity - 0.4).abs() < f32::EPSILON);
    }

    #[test]
    fn hover_only_affects_unassigned_faces() {
        let (mut m, mut ctx) = setup();
        let face = FaceId::new(0, 0);
        ctx.hovered = Some(face);
        assert_eq!(highlight(face, &m, &ctx).color, Color::HOVER);

        m.assign(face, "inlet").unwrap();
        assert_ne!(highlight(face, &m, &ctx).color, Color::HOVER);
    }

    #[test]
    fn untouched_face_uses_default() {
        let (m, ctx) = setup();
        let h = highlight(FaceId::new(4, 4), &m, &ctx);
        assert_eq!(h.color, Color::DEFAULT_FACE);
    }
}
