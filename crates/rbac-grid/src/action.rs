//! Row actions (edit, delete, ...).

use std::fmt;
use std::sync::Arc;

use rbac_model::Record;

type ShowFn = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Visual treatment of an action button.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ActionVariant {
    #[default]
    Default,
    Error,
    Warning,
    Success,
}

/// An action offered on each row.
///
/// The engine does not run actions; clicking one emits
/// [`GridEvent::ActionClick`](crate::GridEvent::ActionClick) for the host.
#[derive(Clone)]
pub struct TableAction {
    pub label: String,
    pub icon: Option<String>,
    pub variant: ActionVariant,
    show: Option<ShowFn>,
}

impl TableAction {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            icon: None,
            variant: ActionVariant::Default,
            show: None,
        }
    }

    #[must_use]
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    #[must_use]
    pub fn variant(mut self, variant: ActionVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Only offer the action on rows matching `show`.
    #[must_use]
    pub fn show_when(mut self, show: impl Fn(&Record) -> bool + Send + Sync + 'static) -> Self {
        self.show = Some(Arc::new(show));
        self
    }

    /// Whether the action applies to `record`.
    pub fn is_visible_for(&self, record: &Record) -> bool {
        self.show.as_ref().is_none_or(|show| show(record))
    }
}

impl fmt::Debug for TableAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableAction")
            .field("label", &self.label)
            .field("variant", &self.variant)
            .field("conditional", &self.show.is_some())
            .finish()
    }
}
