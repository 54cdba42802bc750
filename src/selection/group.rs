use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::reconstruct::FaceId;
use crate::surface::Color;

use super::GroupLabel;

/// A registrable group: label plus display color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDefinition {
    pub label: GroupLabel,
    pub color: Color,
}

impl GroupDefinition {
    /// Creates a definition.
    #[must_use]
    pub fn new(label: GroupLabel, color: Color) -> Self {
        Self { label, color }
    }

    /// The standard boundary-condition groups.
    #[must_use]
    pub fn defaults() -> Vec<GroupDefinition> {
        [
            (GroupLabel::INLET, 0x0022_c55e),
            (GroupLabel::OUTLET, 0x00ef_4444),
            (GroupLabel::WALL, 0x003b_82f6),
            (GroupLabel::SYMMETRY, 0x00a8_55f7),
            (GroupLabel::INTERFACE, 0x00f9_7316),
        ]
        .into_iter()
        .map(|(label, hex)| GroupDefinition {
            label: GroupLabel(label.to_owned()),
            color: Color::from_hex(hex),
        })
        .collect()
    }
}

/// A physical group and its member faces.
#[derive(Debug, Clone)]
pub struct Group {
    pub(super) label: GroupLabel,
    pub(super) color: Color,
    pub(super) faces: BTreeSet<FaceId>,
}

impl Group {
    pub(super) fn new(definition: GroupDefinition) -> Self {
        Self {
            label: definition.label,
            color: definition.color,
            faces: BTreeSet::new(),
        }
    }

    /// Group label.
    #[must_use]
    pub fn label(&self) -> &GroupLabel {
        &self.label
    }

    /// Display color.
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Member faces in id order.
    #[must_use]
    pub fn faces(&self) -> &BTreeSet<FaceId> {
        &self.faces
    }

    /// Number of member faces.
    #[must_use]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    /// Whether the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Aggregate view of one non-empty group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub label: GroupLabel,
    pub color: Color,
    pub face_count: usize,
    /// Total area, present only when every member's area is tracked.
    pub total_area: Option<f64>,
}
