//! Read/write permission matrix.

use rbac_model::{ModuleRef, Permission, PermissionKind};
use serde_json::Value;
use tracing::{trace, warn};

/// One row per module, each with a read and a write flag.
///
/// The matrix is a controlled component: [`toggle`](Self::toggle) returns
/// the new form value and [`write_value`](Self::write_value) accepts one
/// from the form. The value lists only modules with at least one flag set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PermissionsMatrix {
    modules: Vec<ModuleRef>,
    rows: Vec<Permission>,
    disabled: bool,
}

impl PermissionsMatrix {
    /// A matrix with every flag cleared.
    pub fn new(modules: Vec<ModuleRef>) -> Self {
        let rows = modules.iter().map(Permission::none).collect();
        Self {
            modules,
            rows,
            disabled: false,
        }
    }

    pub fn modules(&self) -> &[ModuleRef] {
        &self.modules
    }

    /// Every row, including ones with both flags cleared.
    pub fn rows(&self) -> &[Permission] {
        &self.rows
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Current state of one flag.
    pub fn is_granted(&self, module_id: &str, kind: PermissionKind) -> bool {
        self.rows
            .iter()
            .find(|row| row.module_id == module_id)
            .is_some_and(|row| row.get(kind))
    }

    /// Set one flag and return the new value.
    ///
    /// Returns `None` when the matrix is disabled or the module is not
    /// offered.
    pub fn toggle(
        &mut self,
        module_id: &str,
        kind: PermissionKind,
        checked: bool,
    ) -> Option<Vec<Permission>> {
        if self.disabled {
            return None;
        }

        match self.rows.iter_mut().find(|row| row.module_id == module_id) {
            Some(row) => row.set(kind, checked),
            None => {
                let module = self.modules.iter().find(|m| m.id == module_id)?;
                let mut row = Permission::none(module);
                row.set(kind, checked);
                self.rows.push(row);
            }
        }
        trace!("{} {} set to {}", module_id, kind.label(), checked);

        Some(self.value())
    }

    /// Flip one flag.
    pub fn flip(&mut self, module_id: &str, kind: PermissionKind) -> Option<Vec<Permission>> {
        let checked = !self.is_granted(module_id, kind);
        self.toggle(module_id, kind, checked)
    }

    /// Permissions with at least one flag set, in module order.
    pub fn value(&self) -> Vec<Permission> {
        self.rows
            .iter()
            .filter(|row| row.is_active())
            .cloned()
            .collect()
    }

    /// The value as JSON, for the form control.
    pub fn json_value(&self) -> Value {
        serde_json::to_value(self.value()).unwrap_or_else(|_| Value::Array(Vec::new()))
    }

    /// Load a value. Entries for modules not offered are dropped.
    pub fn write_value(&mut self, value: &[Permission]) {
        self.rows = self
            .modules
            .iter()
            .map(|module| {
                value
                    .iter()
                    .find(|p| p.module_id == module.id)
                    .cloned()
                    .unwrap_or_else(|| Permission::none(module))
            })
            .collect();
    }

    /// Load a JSON value from the form. Anything that is not a permission
    /// list clears the matrix.
    pub fn write_json(&mut self, value: &Value) {
        let parsed = match value {
            Value::Null => Vec::new(),
            other => serde_json::from_value::<Vec<Permission>>(other.clone()).unwrap_or_else(|err| {
                warn!("Ignoring malformed permissions value: {}", err);
                Vec::new()
            }),
        };
        self.write_value(&parsed);
    }

    /// Replace the offered modules, keeping flags of modules that remain.
    pub fn set_modules(&mut self, modules: Vec<ModuleRef>) {
        let current = std::mem::take(&mut self.rows);
        self.modules = modules;
        self.write_value(&current);
    }
}
