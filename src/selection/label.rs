use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SelectionError;

/// Name of a physical group.
///
/// The label doubles as the exported solid name and the output file stem, so
/// it must be non-empty and free of whitespace and path separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupLabel(pub(super) String);

impl GroupLabel {
    pub const INLET: &'static str = "inlet";
    pub const OUTLET: &'static str = "outlet";
    pub const WALL: &'static str = "wall";
    pub const SYMMETRY: &'static str = "symmetry";
    pub const INTERFACE: &'static str = "interface";

    /// Validates and wraps a label.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidLabel`] for empty labels or labels
    /// containing whitespace, `/`, `\`, or `..`.
    pub fn new(label: impl Into<String>) -> Result<Self, SelectionError> {
        let label = label.into();
        let invalid = label.is_empty()
            || label.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\' || c.is_control())
            || label.contains("..");
        if invalid {
            return Err(SelectionError::InvalidLabel(label));
        }
        Ok(Self(label))
    }

    /// The label text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for GroupLabel {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GroupLabel {
    type Error = SelectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for GroupLabel {
    type Error = SelectionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GroupLabel> for String {
    fn from(label: GroupLabel) -> Self {
        label.0
    }
}
