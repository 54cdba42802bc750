//! Physical groups and the face-to-group selection state machine.
//!
//! A face is either unassigned or assigned to exactly one group. Display
//! colors are derived from that state by [`highlight`] and never stored as
//! independent truth.

mod command;
mod context;
mod group;
mod label;
mod manager;

pub use command::{apply_command, CommandOutcome, SelectionCommand};
pub use context::{highlight, Highlight, HighlightPolicy, SelectionContext};
pub use group::{Group, GroupDefinition, GroupSummary};
pub use label::GroupLabel;
pub use manager::{SelectionManager, Toggle};
