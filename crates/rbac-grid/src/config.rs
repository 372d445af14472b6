//! Table configuration.

use serde::{Deserialize, Serialize};

/// Per-table feature switches and defaults.
///
/// Deserialises with every field optional; missing fields take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Table title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Show the search box; when off, the search term is ignored.
    pub show_search: bool,
    pub show_pagination: bool,
    pub show_items_per_page: bool,
    pub show_select_all: bool,
    pub show_download: bool,
    pub search_placeholder: String,
    /// Choices offered in the page-size selector.
    pub items_per_page_options: Vec<usize>,
    /// Page size a fresh table starts with.
    pub default_items_per_page: usize,
    pub empty_message: String,
    /// When off, sort toggles are ignored.
    pub enable_sorting: bool,
    /// When off, selection toggles are ignored.
    pub enable_selection: bool,
    /// Render row actions as a dropdown instead of inline buttons.
    pub use_dropdown_menu: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            title: None,
            show_search: true,
            show_pagination: true,
            show_items_per_page: true,
            show_select_all: true,
            show_download: false,
            search_placeholder: "Search...".to_string(),
            items_per_page_options: vec![10, 20, 50],
            default_items_per_page: 10,
            empty_message: "No data available".to_string(),
            enable_sorting: true,
            enable_selection: true,
            use_dropdown_menu: false,
        }
    }
}

impl GridConfig {
    /// Starting page size, never zero.
    pub fn initial_items_per_page(&self) -> usize {
        if self.default_items_per_page == 0 {
            Self::default().default_items_per_page
        } else {
            self.default_items_per_page
        }
    }
}
