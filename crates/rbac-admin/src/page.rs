//! One admin screen: a server-driven table plus its create/edit form.
//!
//! [`ResourcePage`] owns a [`DataGridEngine`] in server mode and, while one
//! is open, a [`DynamicFormEngine`]. Grid intents that change the query turn
//! into list fetches. Every fetch carries a generation and only the latest
//! one is applied, so a slow response for an old query never overwrites a
//! newer page.

use std::sync::Arc;

use futures_util::future::join_all;
use rbac_api::{ApiError, ListParams, Paginated, ResourceService, SortOrder};
use rbac_form::{
    Debouncer, DynamicFormEngine, FieldDescriptor, FormEvent, FormMode, LoadRequest,
};
use rbac_grid::{ColumnDescriptor, DataGridEngine, GridEvent, GridMessage, GridMode, SortDirection};
use rbac_model::Record;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::PageError;
use crate::settings::Settings;
use crate::toast::ToastQueue;

// =============================================================================
// FETCHES AND EFFECTS
// =============================================================================

/// A list fetch the host must run (or hand to [`ResourcePage::run_fetch`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    pub params: ListParams,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What a grid intent asks of the host.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEffect {
    /// The query changed; run this fetch.
    Fetch(FetchTicket),
    /// The selected rows changed.
    Selection(Vec<Record>),
    /// A row action was clicked.
    RowAction { action: String, item: Record },
    Download,
}

/// The form currently open on the page.
#[derive(Debug, Clone)]
struct OpenForm {
    engine: DynamicFormEngine,
    /// Id of the record being edited; `None` when creating.
    record_id: Option<String>,
}

// =============================================================================
// PAGE
// =============================================================================

pub struct ResourcePage<S> {
    service: Arc<S>,
    grid: DataGridEngine,
    fields: Vec<FieldDescriptor>,
    form: Option<OpenForm>,
    toasts: ToastQueue,

    /// Entity scope passed with every list call.
    entity_id: Option<String>,

    /// Generation of the latest fetch; older responses are dropped.
    fetch_generation: u64,

    search: Debouncer,

    /// Deletes waiting on a confirmation toast, keyed by toast id.
    pending_deletes: Vec<(u64, String)>,
}

impl<S: ResourceService> ResourcePage<S> {
    /// Build a page over `service`.
    ///
    /// Select fields pick up the form defaults from `settings`.
    pub fn new(
        service: Arc<S>,
        columns: Vec<ColumnDescriptor>,
        mut fields: Vec<FieldDescriptor>,
        settings: &Settings,
    ) -> Self {
        for field in &mut fields {
            if let Some(config) = field.paginated_select.take() {
                field.paginated_select = Some(settings.form.apply_to(config));
            }
        }

        let grid = DataGridEngine::new(columns, GridMode::Server).with_config(settings.grid.clone());

        Self {
            service,
            grid,
            fields,
            form: None,
            toasts: ToastQueue::new(settings.toast.duration())
                .with_error_duration(settings.toast.error_duration()),
            entity_id: None,
            fetch_generation: 0,
            search: Debouncer::new(settings.form.debounce()),
            pending_deletes: Vec::new(),
        }
    }

    /// Scope list calls to one entity.
    #[must_use]
    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Replace the grid, e.g. to attach row actions.
    #[must_use]
    pub fn with_grid(mut self, grid: impl FnOnce(DataGridEngine) -> DataGridEngine) -> Self {
        self.grid = grid(self.grid);
        self
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn grid(&self) -> &DataGridEngine {
        &self.grid
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    pub fn form(&self) -> Option<&DynamicFormEngine> {
        self.form.as_ref().map(|open| &open.engine)
    }

    pub fn form_mut(&mut self) -> Option<&mut DynamicFormEngine> {
        self.form.as_mut().map(|open| &mut open.engine)
    }

    /// Id of the record the open form edits.
    pub fn editing_id(&self) -> Option<&str> {
        self.form.as_ref().and_then(|open| open.record_id.as_deref())
    }

    // =========================================================================
    // LISTING
    // =========================================================================

    /// Query for the grid's current page, search and sort.
    pub fn list_params(&self) -> ListParams {
        let mut params = ListParams::new(self.grid.current_page(), self.grid.items_per_page())
            .with_search(self.grid.search_term());
        if let Some(sort) = self.grid.sort() {
            let order = match sort.direction {
                SortDirection::Asc => SortOrder::Asc,
                SortDirection::Desc => SortOrder::Desc,
            };
            params = params.with_sort(sort.column.clone(), order);
        }
        if let Some(entity_id) = &self.entity_id {
            params = params.with_entity(entity_id.clone());
        }
        params
    }

    /// Start a fetch for the current query. Supersedes any fetch in flight.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.fetch_generation += 1;
        self.grid.set_loading(true);
        let params = self.list_params();
        debug!(
            "Fetching {} page {} (generation {})",
            self.service.resource_name(),
            params.page,
            self.fetch_generation
        );
        FetchTicket {
            generation: self.fetch_generation,
            params,
        }
    }

    /// Apply a fetch result. Returns `false` when a newer fetch has started.
    pub fn apply_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Paginated<Record>, ApiError>,
        now: Instant,
    ) -> bool {
        if ticket.generation != self.fetch_generation {
            warn!(
                "Discarding stale {} page (generation {}, current {})",
                self.service.resource_name(),
                ticket.generation,
                self.fetch_generation
            );
            return false;
        }
        self.grid.set_loading(false);

        match result {
            Ok(page) => {
                self.grid.set_total_records(page.pagination.total);
                self.grid.set_current_page(page.pagination.page);
                self.grid.set_records(page.data);
            }
            Err(err) => {
                warn!("Listing {} failed: {}", self.service.resource_name(), err);
                self.toasts.error_from(&err, now);
            }
        }
        true
    }

    /// Run `ticket` against the service and apply the result.
    pub async fn run_fetch(&mut self, ticket: FetchTicket) -> bool {
        let result = self.service.list(&ticket.params).await;
        self.apply_fetch(&ticket, result, Instant::now())
    }

    /// Reload the current page.
    pub async fn refresh(&mut self) -> bool {
        let ticket = self.begin_fetch();
        self.run_fetch(ticket).await
    }

    // =========================================================================
    // GRID INTENTS
    // =========================================================================

    /// Route a grid intent and translate its events.
    ///
    /// Any number of query changes collapse into one fetch.
    pub fn grid_update(&mut self, message: GridMessage) -> Vec<PageEffect> {
        let events = self.grid.update(message);
        self.translate(events)
    }

    /// Record search input typed at `now`; the grid sees it once settled.
    pub fn search_input(&mut self, term: impl Into<String>, now: Instant) {
        self.search.input(term, now);
    }

    /// Apply the search term once it has settled by `now`.
    pub fn poll_search(&mut self, now: Instant) -> Vec<PageEffect> {
        match self.search.poll(now) {
            Some(term) => {
                let events = self.grid.set_search_term(term);
                self.translate(events)
            }
            None => Vec::new(),
        }
    }

    fn translate(&mut self, events: Vec<GridEvent>) -> Vec<PageEffect> {
        let mut effects = Vec::new();
        let mut refetch = false;
        for event in events {
            match event {
                GridEvent::PageChange(_)
                | GridEvent::ItemsPerPageChange(_)
                | GridEvent::SortChange(_)
                | GridEvent::SearchChange(_) => refetch = true,
                GridEvent::SelectionChange(rows) => effects.push(PageEffect::Selection(rows)),
                GridEvent::ActionClick { action, item } => {
                    effects.push(PageEffect::RowAction { action, item });
                }
                GridEvent::DownloadClick => effects.push(PageEffect::Download),
            }
        }
        if refetch {
            effects.push(PageEffect::Fetch(self.begin_fetch()));
        }
        effects
    }

    // =========================================================================
    // FORM
    // =========================================================================

    /// Open an empty create form. Returns the first option loads.
    pub fn open_create(&mut self) -> Result<Vec<LoadRequest>, PageError> {
        self.close_existing();
        let mut engine = DynamicFormEngine::build(self.fields.clone(), None, FormMode::Create)?;
        let loads = engine.initial_loads();
        self.form = Some(OpenForm {
            engine,
            record_id: None,
        });
        debug!("Opened create form for {}", self.service.resource_name());
        Ok(loads)
    }

    /// Open an edit form for `id`.
    ///
    /// The form is disabled while the record loads, then patched with it.
    /// When the load fails the form stays open and enabled and an error
    /// toast is shown.
    pub async fn open_edit(&mut self, id: &str) -> Result<Vec<LoadRequest>, PageError> {
        self.close_existing();
        let mut engine = DynamicFormEngine::build(self.fields.clone(), None, FormMode::Update)?;
        engine.set_disabled_externally(true);
        self.form = Some(OpenForm {
            engine,
            record_id: Some(id.to_string()),
        });

        let result = self.service.get_by_id(id).await;
        let Some(open) = self.form.as_mut() else {
            return Err(PageError::NoForm);
        };
        open.engine.set_disabled_externally(false);

        let record = match result {
            Ok(response) => response.data,
            Err(err) => {
                self.toasts.error_from(&err, Instant::now());
                return Err(err.into());
            }
        };
        let Value::Object(values) = record else {
            return Err(PageError::MalformedRecord { id: id.to_string() });
        };

        // Every select reloads page 1 below, which also resolves the
        // labels of patched values.
        open.engine.patch_values(&values);
        let loads = open.engine.initial_loads();
        debug!("Opened edit form for {} '{}'", self.service.resource_name(), id);
        Ok(loads)
    }

    /// Run option loads concurrently and merge the results into the form.
    ///
    /// Returns how many responses were applied.
    pub async fn run_option_loads(&mut self, requests: Vec<LoadRequest>) -> usize {
        let Some(open) = self.form.as_mut() else {
            return 0;
        };

        let jobs: Vec<_> = requests
            .into_iter()
            .filter_map(|request| {
                let loader = open.engine.loader_for(&request.field)?;
                Some((request, loader))
            })
            .collect();
        let responses = join_all(
            jobs.into_iter()
                .map(|(request, loader)| async move { request.execute(loader.as_ref()).await }),
        )
        .await;

        responses
            .into_iter()
            .map(|response| open.engine.apply_options(response))
            .filter(|applied| *applied)
            .count()
    }

    /// Submit the open form: create or update depending on its mode.
    ///
    /// On success the form closes, a toast is shown and the list reloads.
    pub async fn submit_form(&mut self) -> Result<Vec<FormEvent>, PageError> {
        let Some(open) = self.form.as_mut() else {
            return Err(PageError::NoForm);
        };
        let ticket = open.engine.begin_submit()?;
        let payload = Value::Object(ticket.values().clone());

        let outcome = match &open.record_id {
            Some(id) => self.service.update(id, &payload).await,
            None => self.service.create(&payload).await,
        }
        .map(|response| response.data);

        let events = open.engine.finish_submit(ticket, outcome);
        let now = Instant::now();
        let mut saved = false;
        for event in &events {
            match event {
                FormEvent::SubmitSuccess(_) => {
                    saved = true;
                    let verb = if open.record_id.is_some() { "updated" } else { "created" };
                    info!("{} {}", self.service.resource_name(), verb);
                    self.toasts
                        .success(format!("{} {}", title_case(self.service.resource_name()), verb), now);
                }
                FormEvent::SubmitError(err) => {
                    self.toasts.error_from(err, now);
                }
                FormEvent::Close | FormEvent::CreateRequested { .. } => {}
            }
        }

        if events.contains(&FormEvent::Close) {
            self.form = None;
        }
        if saved {
            self.refresh().await;
        }
        Ok(events)
    }

    /// Close the open form. Returns `false` when it refused (still loading)
    /// or nothing was open.
    pub fn close_form(&mut self) -> bool {
        let closed = self
            .form
            .as_mut()
            .and_then(|open| open.engine.close())
            .is_some();
        if closed {
            self.form = None;
        }
        closed
    }

    fn close_existing(&mut self) {
        if let Some(mut open) = self.form.take() {
            open.engine.teardown();
        }
    }

    // =========================================================================
    // DELETE
    // =========================================================================

    /// Ask for confirmation before deleting the record `id`.
    ///
    /// Shows a delete confirmation toast naming `item_name` and returns its
    /// id. Nothing is deleted until [`Self::confirm_delete`] is called with
    /// that id.
    pub fn request_delete(&mut self, id: impl Into<String>, item_name: &str) -> u64 {
        let toast = self.toasts.confirm_delete(item_name, Instant::now());
        self.pending_deletes.push((toast, id.into()));
        toast
    }

    /// The user confirmed the delete behind `toast_id`.
    ///
    /// Returns `Ok(false)` when no delete is waiting on that toast.
    pub async fn confirm_delete(&mut self, toast_id: u64) -> Result<bool, PageError> {
        let Some(id) = self.take_pending_delete(toast_id) else {
            return Ok(false);
        };
        self.toasts.answer(toast_id, true);
        self.delete(&id).await?;
        Ok(true)
    }

    /// The user cancelled the delete behind `toast_id`.
    pub fn cancel_delete(&mut self, toast_id: u64) -> bool {
        let pending = self.take_pending_delete(toast_id);
        if let Some(id) = &pending {
            debug!("Delete of {} '{}' cancelled", self.service.resource_name(), id);
        }
        self.toasts.answer(toast_id, false);
        pending.is_some()
    }

    fn take_pending_delete(&mut self, toast_id: u64) -> Option<String> {
        let index = self
            .pending_deletes
            .iter()
            .position(|(toast, _)| *toast == toast_id)?;
        Some(self.pending_deletes.remove(index).1)
    }

    /// Delete the record `id`, then reload the list.
    pub async fn delete(&mut self, id: &str) -> Result<(), PageError> {
        let now = Instant::now();
        match self.service.delete(id).await {
            Ok(_) => {
                info!("{} '{}' deleted", self.service.resource_name(), id);
                self.toasts
                    .success(format!("{} deleted", title_case(self.service.resource_name())), now);
                self.refresh().await;
                Ok(())
            }
            Err(err) => {
                warn!("Deleting {} '{}' failed: {}", self.service.resource_name(), id, err);
                self.toasts.error_from(&err, now);
                Err(err.into())
            }
        }
    }
}

/// "user" -> "User".
fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
