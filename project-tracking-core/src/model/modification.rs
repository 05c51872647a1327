use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entity::{Id, SoftFlag};

pub const ENDPOINT: &str = "/modification/{action}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModificationAction {
    Edit,
    Delete,
    Undelete,
    Deprecate,
    Undeprecate,
    Curate,
}

impl ModificationAction {
    /// The flag a soft-state action toggles and the value it sets.
    #[must_use]
    pub fn soft_flag(self) -> Option<(SoftFlag, bool)> {
        match self {
            Self::Delete => Some((SoftFlag::Deleted, true)),
            Self::Undelete => Some((SoftFlag::Deleted, false)),
            Self::Deprecate => Some((SoftFlag::Deprecated, true)),
            Self::Undeprecate => Some((SoftFlag::Deprecated, false)),
            Self::Edit | Self::Curate => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CascadeMode {
    #[default]
    None,
    Cascade,
    CascadeUp,
    CascadeDown,
}

impl CascadeMode {
    #[must_use]
    pub fn down(self) -> bool {
        matches!(self, Self::Cascade | Self::CascadeDown)
    }

    #[must_use]
    pub fn up(self) -> bool {
        matches!(self, Self::Cascade | Self::CascadeUp)
    }
}

/// `cascade` is accepted either as a mode name or as a boolean flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CascadeField {
    Flag(bool),
    Mode(CascadeMode),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModificationRequest {
    #[serde(default)]
    pub modification: Vec<ModificationEntry>,
    #[serde(default)]
    pub cascade: Option<CascadeField>,
    #[serde(default)]
    pub cascade_up: bool,
    #[serde(default)]
    pub cascade_down: bool,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModificationEntry {
    pub table: String,
    #[serde(default)]
    pub id: Vec<Id>,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub new: Option<Value>,
}
