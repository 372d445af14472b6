//! Grid intents (in) and events (out).

use rbac_model::{Record, RowId};

use crate::sort::SortState;

/// Events the grid hands back to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// The visible page changed (1-based).
    PageChange(usize),
    /// The page size changed.
    ItemsPerPageChange(usize),
    /// The sort changed; `None` means unsorted.
    SortChange(Option<SortState>),
    /// The search term changed.
    SearchChange(String),
    /// The selected rows, in backing-array order.
    SelectionChange(Vec<Record>),
    /// A row action was clicked.
    ActionClick { action: String, item: Record },
    /// The download button was clicked.
    DownloadClick,
}

/// User intents, for hosts that route everything through one `update`.
#[derive(Debug, Clone, PartialEq)]
pub enum GridMessage {
    SearchChanged(String),
    SortToggled(String),
    PageSelected(usize),
    ItemsPerPageSelected(usize),
    SelectAllToggled(bool),
    RowToggled(RowId, bool),
    ActionClicked { action: String, row: RowId },
    DownloadClicked,
}
