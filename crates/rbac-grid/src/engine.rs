//! The data-grid engine.

use std::collections::HashSet;

use rbac_model::{BadgeColor, Record, RowId};
use tracing::{debug, trace, warn};

use crate::action::TableAction;
use crate::column::ColumnDescriptor;
use crate::config::GridConfig;
use crate::event::{GridEvent, GridMessage};
use crate::pagination::page_numbers;
use crate::sort::{SortDirection, SortIndicator, SortState, compare_cells};

// =============================================================================
// GRID MODE
// =============================================================================

/// Where filtering, sorting and paging happen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum GridMode {
    /// Everything is computed locally over the full record array.
    #[default]
    Client,
    /// The record array is the already-sliced server page.
    Server,
}

// =============================================================================
// DATA GRID ENGINE
// =============================================================================

/// Displayed-row computation and selection state for one table.
///
/// # Invariants
///
/// - `selected` only ever holds ids of currently loaded records.
/// - `current_page >= 1` and `items_per_page > 0`.
/// - The column list is fixed; [`set_columns`](Self::set_columns) resets
///   all view state.
#[derive(Debug, Clone)]
pub struct DataGridEngine {
    columns: Vec<ColumnDescriptor>,
    actions: Vec<TableAction>,
    config: GridConfig,
    id_key: String,
    mode: GridMode,

    records: Vec<Record>,
    /// Row ids, index-aligned with `records`, computed on load.
    row_ids: Vec<RowId>,
    /// Server-reported total (server mode only).
    total_records: usize,

    search_term: String,
    sort: Option<SortState>,
    current_page: usize,
    items_per_page: usize,
    selected: HashSet<RowId>,
    select_all: bool,
    loading: bool,
}

impl DataGridEngine {
    /// Create an empty grid with default configuration and `"id"` as id key.
    pub fn new(columns: Vec<ColumnDescriptor>, mode: GridMode) -> Self {
        let config = GridConfig::default();
        let items_per_page = config.initial_items_per_page();
        Self {
            columns,
            actions: Vec::new(),
            config,
            id_key: "id".to_string(),
            mode,
            records: Vec::new(),
            row_ids: Vec::new(),
            total_records: 0,
            search_term: String::new(),
            sort: None,
            current_page: 1,
            items_per_page,
            selected: HashSet::new(),
            select_all: false,
            loading: false,
        }
    }

    /// Replace the configuration. Resets the page size to the configured default.
    #[must_use]
    pub fn with_config(mut self, config: GridConfig) -> Self {
        self.items_per_page = config.initial_items_per_page();
        self.config = config;
        self
    }

    /// Use a different record field as row identity.
    #[must_use]
    pub fn with_id_key(mut self, id_key: impl Into<String>) -> Self {
        self.id_key = id_key.into();
        self
    }

    #[must_use]
    pub fn with_actions(mut self, actions: Vec<TableAction>) -> Self {
        self.actions = actions;
        self
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn mode(&self) -> GridMode {
        self.mode
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn actions(&self) -> &[TableAction] {
        &self.actions
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn items_per_page(&self) -> usize {
        self.items_per_page
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_select_all(&self) -> bool {
        self.select_all
    }

    pub fn selected_ids(&self) -> &HashSet<RowId> {
        &self.selected
    }

    pub fn is_selected(&self, id: &RowId) -> bool {
        self.selected.contains(id)
    }

    /// Id of the record at `index` in the backing array.
    pub fn row_id(&self, index: usize) -> Option<&RowId> {
        self.row_ids.get(index)
    }

    // =========================================================================
    // DATA
    // =========================================================================

    /// Replace the backing records.
    ///
    /// Client mode returns to page 1; server mode keeps the externally driven
    /// page. Row ids are computed once here, and selection is pruned to keyed
    /// rows that are still loaded. Positional ids name a slot, not a record,
    /// so they never survive a reload.
    pub fn set_records(&mut self, records: Vec<Record>) {
        let mut synthetic = 0usize;
        self.row_ids = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                RowId::from_record(record, &self.id_key).unwrap_or_else(|| {
                    synthetic += 1;
                    RowId::Synthetic(index)
                })
            })
            .collect();
        if synthetic > 0 {
            warn!(
                "{} of {} rows have no '{}' field; using positional ids",
                synthetic,
                records.len(),
                self.id_key
            );
        }
        self.records = records;

        if self.mode == GridMode::Client {
            self.current_page = 1;
        }

        let loaded: HashSet<&RowId> = self.row_ids.iter().collect();
        self.selected
            .retain(|id| !id.is_synthetic() && loaded.contains(id));
        self.refresh_select_all();

        debug!(
            "Grid loaded {} records (page {})",
            self.records.len(),
            self.current_page
        );
    }

    /// Total record count reported by the server (server mode).
    pub fn set_total_records(&mut self, total: usize) {
        self.total_records = total;
    }

    /// Server mode: adopt the page the server says it returned.
    pub fn set_current_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    /// Replace the columns. Columns are fixed per table, so this resets
    /// search, sort, paging and selection.
    pub fn set_columns(&mut self, columns: Vec<ColumnDescriptor>) {
        self.columns = columns;
        self.search_term.clear();
        self.sort = None;
        self.current_page = 1;
        self.items_per_page = self.config.initial_items_per_page();
        self.selected.clear();
        self.select_all = false;
    }

    // =========================================================================
    // INTENTS
    // =========================================================================

    /// Dispatch a [`GridMessage`] to the matching intent.
    pub fn update(&mut self, message: GridMessage) -> Vec<GridEvent> {
        match message {
            GridMessage::SearchChanged(term) => self.set_search_term(term),
            GridMessage::SortToggled(column) => self.toggle_sort(&column),
            GridMessage::PageSelected(page) => self.set_page(page),
            GridMessage::ItemsPerPageSelected(n) => self.set_items_per_page(n),
            GridMessage::SelectAllToggled(checked) => self.toggle_select_all(checked),
            GridMessage::RowToggled(id, checked) => self.toggle_row_selection(&id, checked),
            GridMessage::ActionClicked { action, row } => self.handle_action(&action, &row),
            GridMessage::DownloadClicked => self.request_download(),
        }
    }

    /// Change the search term.
    ///
    /// Client mode filters locally and returns to page 1. Server mode only
    /// reports the term; the host re-fetches. Selection is kept either way.
    pub fn set_search_term(&mut self, term: impl Into<String>) -> Vec<GridEvent> {
        let term = term.into();
        trace!("Search term changed to '{}'", term);
        self.search_term = term.clone();
        self.current_page = 1;
        if self.mode == GridMode::Client {
            self.refresh_select_all();
        }
        vec![GridEvent::SearchChange(term)]
    }

    /// Cycle a column through unsorted → asc → desc → unsorted.
    ///
    /// Sorting a different column starts it at asc and drops the previous
    /// column's sort. Non-sortable or unknown columns are ignored.
    pub fn toggle_sort(&mut self, column_key: &str) -> Vec<GridEvent> {
        if !self.config.enable_sorting {
            return Vec::new();
        }
        let Some(column) = self.columns.iter().find(|c| c.key == column_key) else {
            return Vec::new();
        };
        if !column.sortable {
            return Vec::new();
        }

        self.sort = match &self.sort {
            Some(current) if current.column == column_key => match current.direction {
                SortDirection::Asc => Some(SortState::new(column_key, SortDirection::Desc)),
                SortDirection::Desc => None,
            },
            _ => Some(SortState::new(column_key, SortDirection::Asc)),
        };
        debug!("Sort changed: {:?}", self.sort);

        if self.mode == GridMode::Client {
            self.refresh_select_all();
        }
        vec![GridEvent::SortChange(self.sort.clone())]
    }

    /// Go to page `page` (1-based). Out-of-range pages are ignored.
    ///
    /// Selection is page-scoped, so it is cleared.
    pub fn set_page(&mut self, page: usize) -> Vec<GridEvent> {
        if page < 1 || page > self.total_pages() {
            trace!("Ignoring page {} (total {})", page, self.total_pages());
            return Vec::new();
        }

        self.current_page = page;
        let mut events = self.clear_selection();
        events.insert(0, GridEvent::PageChange(page));
        events
    }

    /// Change the page size. Returns to page 1 and clears the selection.
    pub fn set_items_per_page(&mut self, items_per_page: usize) -> Vec<GridEvent> {
        if items_per_page == 0 {
            return Vec::new();
        }

        self.items_per_page = items_per_page;
        self.current_page = 1;
        let mut events = vec![GridEvent::ItemsPerPageChange(items_per_page)];
        events.extend(self.clear_selection());
        if self.mode == GridMode::Server {
            events.push(GridEvent::PageChange(1));
        }
        events
    }

    /// Select or deselect every row on the current page.
    ///
    /// Selections on other pages are untouched.
    pub fn toggle_select_all(&mut self, checked: bool) -> Vec<GridEvent> {
        if !self.config.enable_selection {
            return Vec::new();
        }

        let page_ids: Vec<RowId> = self
            .page_indices()
            .into_iter()
            .map(|index| self.row_ids[index].clone())
            .collect();
        if checked {
            self.selected.extend(page_ids.iter().cloned());
        } else {
            for id in &page_ids {
                self.selected.remove(id);
            }
        }
        self.select_all = checked && !page_ids.is_empty();

        vec![GridEvent::SelectionChange(self.selected_rows())]
    }

    /// Select or deselect one row. Ids that are not loaded are ignored.
    pub fn toggle_row_selection(&mut self, id: &RowId, checked: bool) -> Vec<GridEvent> {
        if !self.config.enable_selection || !self.row_ids.contains(id) {
            return Vec::new();
        }

        if checked {
            self.selected.insert(id.clone());
        } else {
            self.selected.remove(id);
        }
        self.refresh_select_all();

        vec![GridEvent::SelectionChange(self.selected_rows())]
    }

    /// Report an action click on a row, if the action applies to it.
    pub fn handle_action(&self, action: &str, id: &RowId) -> Vec<GridEvent> {
        let Some(table_action) = self.actions.iter().find(|a| a.label == action) else {
            return Vec::new();
        };
        let Some(record) = self.record_by_id(id) else {
            return Vec::new();
        };
        if !table_action.is_visible_for(record) {
            return Vec::new();
        }

        vec![GridEvent::ActionClick {
            action: table_action.label.clone(),
            item: record.clone(),
        }]
    }

    pub fn request_download(&self) -> Vec<GridEvent> {
        vec![GridEvent::DownloadClick]
    }

    // =========================================================================
    // DERIVED VIEWS
    // =========================================================================

    /// Rows after search and sort (client mode), or the backing array
    /// verbatim (server mode).
    pub fn filtered_rows(&self) -> Vec<&Record> {
        self.filtered_indices()
            .into_iter()
            .map(|index| &self.records[index])
            .collect()
    }

    /// Rows on the current page.
    pub fn page_rows(&self) -> Vec<&Record> {
        self.page_indices()
            .into_iter()
            .map(|index| &self.records[index])
            .collect()
    }

    /// Ids of the rows on the current page, in display order.
    pub fn page_row_ids(&self) -> Vec<&RowId> {
        self.page_indices()
            .into_iter()
            .map(|index| &self.row_ids[index])
            .collect()
    }

    /// Number of rows across all pages.
    pub fn total_count(&self) -> usize {
        match self.mode {
            GridMode::Server => self.total_records,
            GridMode::Client => self.filtered_indices().len(),
        }
    }

    /// `ceil(total / items_per_page)`; zero for an empty table.
    pub fn total_pages(&self) -> usize {
        self.total_count().div_ceil(self.items_per_page)
    }

    /// 1-based index of the first row on the page (0 when empty).
    pub fn start_index(&self) -> usize {
        if self.total_count() == 0 {
            0
        } else {
            (self.current_page - 1) * self.items_per_page + 1
        }
    }

    /// 1-based index of the last row on the page.
    pub fn end_index(&self) -> usize {
        (self.current_page * self.items_per_page).min(self.total_count())
    }

    /// Page buttons to render, at most `max_visible`.
    pub fn page_numbers(&self, max_visible: usize) -> Vec<usize> {
        page_numbers(self.current_page, self.total_pages(), max_visible)
    }

    /// Selected records in backing-array order.
    pub fn selected_rows(&self) -> Vec<Record> {
        self.records
            .iter()
            .zip(&self.row_ids)
            .filter(|(_, id)| self.selected.contains(*id))
            .map(|(record, _)| record.clone())
            .collect()
    }

    pub fn record_by_id(&self, id: &RowId) -> Option<&Record> {
        self.row_ids
            .iter()
            .position(|row_id| row_id == id)
            .map(|index| &self.records[index])
    }

    /// Text of a cell.
    pub fn cell_text(&self, record: &Record, column: &ColumnDescriptor) -> String {
        column.cell_text(record)
    }

    pub fn badge_color(&self, record: &Record, column: &ColumnDescriptor) -> BadgeColor {
        column.badge_color_for(record)
    }

    /// Header arrow for `column_key`.
    pub fn sort_indicator(&self, column_key: &str) -> SortIndicator {
        match &self.sort {
            Some(sort) if sort.column == column_key => match sort.direction {
                SortDirection::Asc => SortIndicator::Asc,
                SortDirection::Desc => SortIndicator::Desc,
            },
            _ => SortIndicator::Both,
        }
    }

    /// Actions to offer on `record`.
    pub fn visible_actions(&self, record: &Record) -> Vec<&TableAction> {
        self.actions
            .iter()
            .filter(|action| action.is_visible_for(record))
            .collect()
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn filtered_indices(&self) -> Vec<usize> {
        if self.mode == GridMode::Server {
            return (0..self.records.len()).collect();
        }

        let mut indices: Vec<usize> = (0..self.records.len()).collect();

        if self.config.show_search && !self.search_term.is_empty() {
            let needle = self.search_term.to_lowercase();
            let searchable: Vec<&ColumnDescriptor> =
                self.columns.iter().filter(|c| c.searchable).collect();
            indices.retain(|&index| {
                let record = &self.records[index];
                searchable
                    .iter()
                    .any(|column| column.cell_text(record).to_lowercase().contains(&needle))
            });
        }

        if self.config.enable_sorting
            && let Some(sort) = &self.sort
            && let Some(column) = self
                .columns
                .iter()
                .find(|c| c.key == sort.column && c.sortable)
        {
            let keys: Vec<_> = self
                .records
                .iter()
                .map(|record| column.raw_value(record))
                .collect();
            indices.sort_by(|&a, &b| {
                compare_cells(keys[a].as_ref(), keys[b].as_ref(), sort.direction)
            });
        }

        indices
    }

    fn page_indices(&self) -> Vec<usize> {
        let filtered = self.filtered_indices();
        if self.mode == GridMode::Server {
            return filtered;
        }

        let start = (self.current_page - 1) * self.items_per_page;
        filtered
            .into_iter()
            .skip(start)
            .take(self.items_per_page)
            .collect()
    }

    fn refresh_select_all(&mut self) {
        let page = self.page_indices();
        self.select_all = !page.is_empty()
            && page
                .iter()
                .all(|&index| self.selected.contains(&self.row_ids[index]));
    }

    fn clear_selection(&mut self) -> Vec<GridEvent> {
        self.select_all = false;
        if self.selected.is_empty() {
            return Vec::new();
        }
        self.selected.clear();
        vec![GridEvent::SelectionChange(Vec::new())]
    }
}
