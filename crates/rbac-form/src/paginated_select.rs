//! Select whose options are fetched page by page.
//!
//! [`PaginatedSelectState`] is a synchronous state machine. Anything that
//! needs the network comes back as a [`LoadRequest`]; the host runs it
//! through an [`OptionLoader`] and hands the [`LoadResponse`] back. Every
//! request carries a generation, and responses from an older generation
//! are discarded, so a slow page for a superseded search never clobbers
//! the current list.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rbac_api::ApiError;
use rbac_model::{OptionValue, SelectOption, display_value};
use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::debounce::{DEFAULT_DEBOUNCE, Debouncer};

/// Value emitted by the "create new" entry unless configured otherwise.
pub const DEFAULT_CREATE_VALUE: &str = "__create_new__";

/// Scroll distance from the bottom that triggers the next page.
pub const LOAD_MORE_THRESHOLD_PX: f32 = 50.0;

// =============================================================================
// LOADER
// =============================================================================

/// One page of options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionPage {
    pub options: Vec<SelectOption>,
    pub has_more: bool,
    /// Total option count, when the source knows it.
    pub total: Option<usize>,
}

/// Failed option load.
#[derive(Debug, Clone, Error, PartialEq)]
#[non_exhaustive]
pub enum LoadError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Option loading was cancelled")]
    Cancelled,
}

/// Source of options for a paginated select.
#[async_trait]
pub trait OptionLoader: Send + Sync {
    /// Fetch `page` (1-based) of at most `limit` options.
    async fn load_options(
        &self,
        page: usize,
        limit: usize,
        search: Option<&str>,
    ) -> Result<OptionPage, LoadError>;
}

// =============================================================================
// CONFIG
// =============================================================================

/// Behaviour of one paginated select.
///
/// Values set through the builder methods are the field's own and win over
/// host-wide fallbacks applied with [`PaginatedSelectConfig::with_fallbacks`].
#[derive(Clone)]
pub struct PaginatedSelectConfig {
    loader: Arc<dyn OptionLoader>,
    explicit: Explicit,
    pub search_placeholder: String,
    /// Page size requested from the loader.
    pub items_per_page: usize,
    pub show_search: bool,
    /// Offer a "create new" entry.
    pub allow_create: bool,
    pub create_label: String,
    /// Sentinel value of the "create new" entry.
    pub create_value: String,
    /// Settle period for search input.
    pub debounce: Duration,
}

impl PaginatedSelectConfig {
    pub fn new(loader: Arc<dyn OptionLoader>) -> Self {
        Self {
            loader,
            search_placeholder: "Search...".to_string(),
            items_per_page: 10,
            show_search: true,
            allow_create: false,
            create_label: "Create New".to_string(),
            create_value: DEFAULT_CREATE_VALUE.to_string(),
            debounce: DEFAULT_DEBOUNCE,
            explicit: Explicit::default(),
        }
    }

    /// Offer a "create new" entry with `label`.
    #[must_use]
    pub fn allow_create(mut self, label: impl Into<String>) -> Self {
        self.allow_create = true;
        self.create_label = label.into();
        self
    }

    #[must_use]
    pub fn items_per_page(mut self, items_per_page: usize) -> Self {
        self.items_per_page = items_per_page.max(1);
        self.explicit.items_per_page = true;
        self
    }

    #[must_use]
    pub fn search_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.search_placeholder = placeholder.into();
        self
    }

    #[must_use]
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self.explicit.debounce = true;
        self
    }

    /// Use `value` as the sentinel of the "create new" entry.
    #[must_use]
    pub fn create_value(mut self, value: impl Into<String>) -> Self {
        self.create_value = value.into();
        self.explicit.create_value = true;
        self
    }

    /// Fill in page size, debounce and create sentinel where the field did
    /// not set them itself. An empty `create_value` leaves the sentinel alone.
    #[must_use]
    pub fn with_fallbacks(
        mut self,
        items_per_page: usize,
        debounce: Duration,
        create_value: &str,
    ) -> Self {
        if !self.explicit.items_per_page {
            self.items_per_page = items_per_page.max(1);
        }
        if !self.explicit.debounce {
            self.debounce = debounce;
        }
        if !self.explicit.create_value && !create_value.is_empty() {
            self.create_value = create_value.to_string();
        }
        self
    }

    /// Whether `value` is the create sentinel.
    pub fn is_create_value(&self, value: &Value) -> bool {
        value.as_str() == Some(self.create_value.as_str())
    }

    pub fn loader(&self) -> Arc<dyn OptionLoader> {
        Arc::clone(&self.loader)
    }
}

/// Which values the field set itself.
#[derive(Debug, Default, Clone, Copy)]
struct Explicit {
    items_per_page: bool,
    debounce: bool,
    create_value: bool,
}

impl fmt::Debug for PaginatedSelectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginatedSelectConfig")
            .field("items_per_page", &self.items_per_page)
            .field("allow_create", &self.allow_create)
            .field("create_value", &self.create_value)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

/// A page fetch the host must run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    /// Key of the form field the select belongs to.
    pub field: String,
    pub generation: u64,
    pub page: usize,
    pub limit: usize,
    pub search: Option<String>,
}

impl LoadRequest {
    /// Run the request against `loader`.
    pub async fn execute(self, loader: &dyn OptionLoader) -> LoadResponse {
        let result = loader
            .load_options(self.page, self.limit, self.search.as_deref())
            .await;
        LoadResponse {
            field: self.field,
            generation: self.generation,
            page: self.page,
            result,
        }
    }
}

/// Outcome of a [`LoadRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadResponse {
    pub field: String,
    pub generation: u64,
    pub page: usize,
    pub result: Result<OptionPage, LoadError>,
}

/// What choosing an entry did.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectOutcome {
    /// A real option was chosen; write it into the form.
    Selected(OptionValue),
    /// The "create new" entry was chosen; the value is unchanged.
    CreateRequested,
    /// Disabled or unknown entry.
    Ignored,
}

// =============================================================================
// STATE
// =============================================================================

/// Incremental fetch state of one paginated select.
#[derive(Debug, Clone)]
pub struct PaginatedSelectState {
    field: String,
    config: PaginatedSelectConfig,

    /// Accumulated options, unique by value.
    options: Vec<SelectOption>,
    selected: Option<OptionValue>,
    selected_label: String,
    search_term: String,
    current_page: usize,
    has_more: bool,
    loading: bool,
    open: bool,

    /// Bumped whenever accumulated options are invalidated.
    generation: u64,

    /// Just-created option kept at the top until a page-1 load includes it.
    pinned: Option<SelectOption>,

    debouncer: Debouncer,
    torn_down: bool,
}

impl PaginatedSelectState {
    pub fn new(field: impl Into<String>, config: PaginatedSelectConfig) -> Self {
        let debouncer = Debouncer::new(config.debounce);
        Self {
            field: field.into(),
            config,
            options: Vec::new(),
            selected: None,
            selected_label: String::new(),
            search_term: String::new(),
            current_page: 1,
            has_more: false,
            loading: false,
            open: false,
            generation: 0,
            pinned: None,
            debouncer,
            torn_down: false,
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn config(&self) -> &PaginatedSelectConfig {
        &self.config
    }

    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn selected(&self) -> Option<&OptionValue> {
        self.selected.as_ref()
    }

    /// Label of the selected value. Falls back to the value's text when the
    /// option has not been loaded yet.
    pub fn selected_label(&self) -> &str {
        &self.selected_label
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pinned(&self) -> Option<&SelectOption> {
        self.pinned.as_ref()
    }

    /// Deadline of pending search input, for hosts that schedule a poll.
    pub fn search_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    // =========================================================================
    // DROPDOWN
    // =========================================================================

    /// Open or close the dropdown. Opening with no options loads page 1.
    pub fn toggle(&mut self, disabled: bool) -> Option<LoadRequest> {
        if disabled || self.torn_down {
            return None;
        }
        self.open = !self.open;
        if self.open && self.options.is_empty() {
            self.restart()
        } else {
            None
        }
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    // =========================================================================
    // LOADING
    // =========================================================================

    /// Request the next page, if there is one and nothing is loading.
    pub fn load_more(&mut self) -> Option<LoadRequest> {
        if !self.has_more || self.loading || self.torn_down {
            return None;
        }
        Some(self.request(self.current_page + 1))
    }

    /// Load more once the list is scrolled within
    /// [`LOAD_MORE_THRESHOLD_PX`] of its bottom.
    pub fn on_scroll(&mut self, remaining_px: f32) -> Option<LoadRequest> {
        if remaining_px < LOAD_MORE_THRESHOLD_PX {
            self.load_more()
        } else {
            None
        }
    }

    /// Record search input typed at `now`.
    pub fn search_input(&mut self, term: impl Into<String>, now: Instant) {
        if self.torn_down {
            return;
        }
        self.debouncer.input(term, now);
    }

    /// Fire the pending search once it has settled.
    ///
    /// A settled, changed term discards accumulated options and restarts
    /// at page 1. It also releases a pinned created option, which is only
    /// kept in front of the unfiltered list.
    pub fn poll_search(&mut self, now: Instant) -> Option<LoadRequest> {
        let term = self.debouncer.poll(now)?;
        self.apply_search(term)
    }

    /// Wait on the tokio clock for pending search input to settle.
    pub async fn settled_search(&mut self) -> Option<LoadRequest> {
        let term = self.debouncer.settled().await?;
        self.apply_search(term)
    }

    fn apply_search(&mut self, term: String) -> Option<LoadRequest> {
        if self.torn_down {
            return None;
        }
        debug!("Option search for '{}' settled on {}", term, self.field);
        self.search_term = term;
        self.pinned = None;
        self.restart()
    }

    /// Merge a finished load. Returns `false` when the response was stale.
    pub fn apply(&mut self, response: LoadResponse) -> bool {
        if self.torn_down || response.generation != self.generation {
            warn!(
                "Discarding stale option page {} for {} (generation {}, current {})",
                response.page, self.field, response.generation, self.generation
            );
            return false;
        }
        self.loading = false;

        let page = match response.result {
            Ok(page) => page,
            Err(err) => {
                warn!("Loading options for {} failed: {}", self.field, err);
                return true;
            }
        };

        self.current_page = response.page;
        self.has_more = page.has_more;
        if response.page == 1 {
            self.options.clear();
            let listed = self
                .pinned
                .as_ref()
                .map(|pinned| page.options.iter().any(|o| o.value == pinned.value));
            match listed {
                Some(true) => self.pinned = None,
                Some(false) => self.options.extend(self.pinned.clone()),
                None => {}
            }
        }
        for option in page.options {
            merge_option(&mut self.options, option);
        }
        trace!(
            "{} now holds {} options (page {}, more: {})",
            self.field,
            self.options.len(),
            self.current_page,
            self.has_more
        );

        self.refresh_label(response.page == 1);
        true
    }

    // =========================================================================
    // SELECTION
    // =========================================================================

    /// Choose the entry with `value`.
    ///
    /// The create sentinel never becomes the selected value.
    pub fn choose(&mut self, value: &OptionValue) -> SelectOutcome {
        if self.config.allow_create && self.config.is_create_value(value) {
            self.open = false;
            return SelectOutcome::CreateRequested;
        }

        let Some(option) = self.options.iter().find(|o| &o.value == value) else {
            return SelectOutcome::Ignored;
        };
        if option.disabled {
            return SelectOutcome::Ignored;
        }

        self.selected = Some(option.value.clone());
        self.selected_label = option.label.clone();
        self.open = false;
        SelectOutcome::Selected(option.value.clone())
    }

    /// Accept a value set from outside (patched, seeded or reset).
    ///
    /// An unknown value invalidates the loaded options and reloads page 1
    /// so its label can be found.
    pub fn set_value(&mut self, value: Option<OptionValue>) -> Option<LoadRequest> {
        let value = value.filter(|v| !rbac_model::is_empty_value(v));
        if value == self.selected {
            return None;
        }
        self.selected = value;

        let Some(selected) = &self.selected else {
            self.selected_label.clear();
            return None;
        };
        if let Some(option) = self.options.iter().find(|o| &o.value == selected) {
            self.selected_label = option.label.clone();
            return None;
        }

        self.selected_label = display_value(Some(selected));
        if self.torn_down {
            return None;
        }
        self.options.clear();
        self.restart()
    }

    /// Select a just-created option and keep it listed until page 1 of
    /// the source includes it.
    pub fn pin_created(&mut self, option: SelectOption) -> Option<LoadRequest> {
        self.pinned = Some(option.clone());
        if !self.options.iter().any(|o| o.value == option.value) {
            self.options.insert(0, option.clone());
        }
        self.selected = Some(option.value);
        self.selected_label = option.label;
        if self.torn_down {
            return None;
        }
        self.restart()
    }

    /// Set the selected value without loading anything. Used when a form
    /// seeds or resets its controls.
    pub fn seed(&mut self, value: Option<OptionValue>) {
        self.selected = value.filter(|v| !rbac_model::is_empty_value(v));
        self.selected_label = match &self.selected {
            Some(selected) => self
                .options
                .iter()
                .find(|o| &o.value == selected)
                .map(|o| o.label.clone())
                .unwrap_or_else(|| display_value(Some(selected))),
            None => String::new(),
        };
    }

    /// Request page 1 from scratch.
    pub fn load_first_page(&mut self) -> Option<LoadRequest> {
        self.restart()
    }

    // =========================================================================
    // LIFECYCLE
    // =========================================================================

    /// Drop pending search input and invalidate in-flight loads.
    pub fn cancel_pending(&mut self) {
        self.debouncer.cancel();
        self.generation += 1;
        self.loading = false;
    }

    /// Return to the unopened state, keeping configuration.
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.debouncer.reset();
        self.options.clear();
        self.selected = None;
        self.selected_label.clear();
        self.search_term.clear();
        self.current_page = 1;
        self.has_more = false;
        self.open = false;
        self.pinned = None;
    }

    /// Stop for good: pending input is dropped and every later response or
    /// input is ignored.
    pub fn teardown(&mut self) {
        self.cancel_pending();
        self.open = false;
        self.torn_down = true;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    /// Invalidate accumulated options and request page 1.
    fn restart(&mut self) -> Option<LoadRequest> {
        if self.torn_down {
            return None;
        }
        self.generation += 1;
        self.current_page = 1;
        self.has_more = false;
        Some(self.request(1))
    }

    fn request(&mut self, page: usize) -> LoadRequest {
        self.loading = true;
        LoadRequest {
            field: self.field.clone(),
            generation: self.generation,
            page,
            limit: self.config.items_per_page,
            search: Some(self.search_term.clone()).filter(|s| !s.is_empty()),
        }
    }

    fn refresh_label(&mut self, first_page: bool) {
        let Some(selected) = &self.selected else {
            return;
        };
        if let Some(option) = self.options.iter().find(|o| &o.value == selected) {
            self.selected_label = option.label.clone();
        } else if first_page {
            self.selected_label = display_value(Some(selected));
        }
    }
}

/// Insert `option`, or refresh the label of the entry with the same value in
/// place.
fn merge_option(options: &mut Vec<SelectOption>, option: SelectOption) {
    match options.iter_mut().find(|o| o.value == option.value) {
        Some(existing) => {
            existing.label = option.label;
            existing.disabled = option.disabled;
        }
        None => options.push(option),
    }
}
