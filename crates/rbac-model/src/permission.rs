//! Module permissions assigned to roles.

use serde::{Deserialize, Serialize};

/// A module that permissions can be granted on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRef {
    pub id: String,
    pub name: String,
}

impl ModuleRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Read/write grant for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub module_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
}

impl Permission {
    /// A permission with both flags cleared.
    pub fn none(module: &ModuleRef) -> Self {
        Self {
            module_id: module.id.clone(),
            name: module.name.clone(),
            read: false,
            write: false,
        }
    }

    /// Whether at least one flag is granted.
    pub fn is_active(&self) -> bool {
        self.read || self.write
    }

    /// Get one flag.
    pub fn get(&self, kind: PermissionKind) -> bool {
        match kind {
            PermissionKind::Read => self.read,
            PermissionKind::Write => self.write,
        }
    }

    /// Set one flag.
    pub fn set(&mut self, kind: PermissionKind, granted: bool) {
        match kind {
            PermissionKind::Read => self.read = granted,
            PermissionKind::Write => self.write = granted,
        }
    }
}

/// Which permission flag an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionKind {
    Read,
    Write,
}

impl PermissionKind {
    /// Get display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Read => "Read",
            Self::Write => "Write",
        }
    }
}
