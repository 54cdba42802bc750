//! Session configuration, loadable from JSON.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::export::DEFAULT_EXTENSION;
use crate::reconstruct::ReconstructionParams;
use crate::selection::{GroupDefinition, HighlightPolicy};

/// Everything a [`FaceSession`](crate::session::FaceSession) needs to start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub reconstruction: ReconstructionParams,
    pub highlight: HighlightPolicy,
    /// Groups registered at startup, in display order. The first one is the
    /// initial active group.
    pub groups: Vec<GroupDefinition>,
    pub file_extension: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconstruction: ReconstructionParams::default(),
            highlight: HighlightPolicy::default(),
            groups: GroupDefinition::defaults(),
            file_extension: DEFAULT_EXTENSION.to_owned(),
        }
    }
}

impl SessionConfig {
    /// Parses and validates a JSON document. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::InvalidValue`] for out-of-range values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`SessionConfig::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serializes to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if serialization fails.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks value ranges and label uniqueness.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.reconstruction.validate()?;

        let opacity = self.highlight.inactive_opacity;
        if !(0.0..=1.0).contains(&opacity) {
            return Err(ConfigError::InvalidValue {
                field: "highlight.inactive_opacity",
                reason: format!("{opacity} is outside [0, 1]"),
            });
        }

        let mut seen = HashSet::new();
        for group in &self.groups {
            if !seen.insert(group.label.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "groups",
                    reason: format!("label '{}' appears twice", group.label),
                });
            }
        }

        let ext = &self.file_extension;
        if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::InvalidValue {
                field: "file_extension",
                reason: format!("'{ext}' must be non-empty ASCII alphanumerics"),
            });
        }
        Ok(())
    }
}
