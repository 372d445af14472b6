//! Badge colours for status-like table cells.

use serde::{Deserialize, Serialize};

/// Semantic colour of a badge cell.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeColor {
    Success,
    Warning,
    Error,
    #[default]
    Info,
}

impl BadgeColor {
    /// Lowercase name used by the view layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}
