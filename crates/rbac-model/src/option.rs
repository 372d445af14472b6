//! Select options.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value carried by a select option (a string or a number in practice).
pub type OptionValue = Value;

/// One choice in a static or paginated select.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Value written into the form control when chosen.
    pub value: OptionValue,
    /// Text shown to the operator.
    pub label: String,
    /// Disabled options are listed but cannot be chosen.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

impl SelectOption {
    /// Create an enabled option.
    pub fn new(value: impl Into<OptionValue>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            disabled: false,
        }
    }

    /// Mark the option as disabled.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}
