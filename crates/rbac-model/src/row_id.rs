//! Row identity.

use std::fmt;

use serde_json::Value;

use crate::record::{display_value, resolve_path};

/// Identity of a table row, used for selection tracking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowId {
    /// Id taken from the record's configured id field.
    Key(String),
    /// Fallback for records without an id, fixed to the row's position in
    /// the backing array at load time.
    Synthetic(usize),
}

impl RowId {
    /// Read the id of `record` from `id_key`.
    ///
    /// Returns `None` if the field is absent, null or an empty string.
    pub fn from_record(record: &Value, id_key: &str) -> Option<Self> {
        let value = resolve_path(record, id_key)?;
        let text = display_value(Some(value));
        if text.is_empty() {
            None
        } else {
            Some(Self::Key(text))
        }
    }

    /// Build a key id directly.
    pub fn key(id: impl Into<String>) -> Self {
        Self::Key(id.into())
    }

    /// Whether this id had to be synthesised.
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Synthetic(_))
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Synthetic(index) => write!(f, "#{index}"),
        }
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        Self::Key(value.to_string())
    }
}
