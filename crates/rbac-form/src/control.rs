//! Per-field control state.

use serde_json::Value;

/// Live state of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldControl {
    pub(crate) value: Value,
    /// Value the control was built with; `close` resets to it.
    pub(crate) seed: Value,
    pub(crate) touched: bool,
    /// Effective flag: static `disabled` or external loading.
    pub(crate) disabled: bool,
}

impl FieldControl {
    pub(crate) fn new(seed: Value, disabled: bool) -> Self {
        Self {
            value: seed.clone(),
            seed,
            touched: false,
            disabled,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_touched(&self) -> bool {
        self.touched
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub(crate) fn reset(&mut self) {
        self.value = self.seed.clone();
        self.touched = false;
    }
}
